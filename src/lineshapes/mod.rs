//! # Line Shapes
//!
//! The closed set of spectral shapes a component can take. Each shape has a
//! declarative hint table describing its parameters (in evaluation order),
//! the independent variables it reads, and an evaluation rule.
//!
//! | shape                                | display name           | needs    |
//! |--------------------------------------|------------------------|----------|
//! | [`LineShape::AsymmetricConvolvedPeak`] | `"CasaLA"`           | `x`      |
//! | [`LineShape::ShirleyBackground`]     | `"Shirley background"` | `x`, `y` |
//! | [`LineShape::Voigt`]                 | `"Voigt"`              | `x`      |
//!
//! ```rust
//! use ndarray::Array1;
//! use xpsfit_rs::lineshapes::LineShape;
//!
//! let shape = LineShape::from_name("Voigt").unwrap();
//! let names: Vec<&str> = shape.param_hints().iter().map(|h| h.name).collect();
//! assert_eq!(names, vec!["amplitude", "center", "sigma", "gamma"]);
//!
//! let x = Array1::linspace(0.0, 10.0, 101);
//! let y = shape.evaluate(&[1.0, 5.0, 0.3, 0.2], x.view(), None).unwrap();
//! assert_eq!(y.len(), 101);
//! ```

pub mod asymmetric;
pub mod shirley;
pub mod voigt;

use ndarray::{Array1, ArrayView1};

use crate::error::{PeakFitError, Result};
use crate::guess::PeakEstimate;
use crate::parameters::BoundedSpec;

pub use asymmetric::EnergyAxis;
pub use shirley::ShirleyConfig;

/// Independent variables a line shape can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndependentVar {
    /// Energy axis
    X,
    /// Observed intensity
    Y,
}

impl IndependentVar {
    /// Variable name as used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            IndependentVar::X => "x",
            IndependentVar::Y => "y",
        }
    }
}

/// Declarative description of one shape parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamHint {
    /// Unprefixed parameter name
    pub name: &'static str,
    /// Partial bounded value the default is built from
    pub spec: BoundedSpec,
    /// Whether the parameter is free in a fit by default
    pub vary: bool,
}

const fn hint(name: &'static str, value: f64, min: Option<f64>) -> ParamHint {
    ParamHint {
        name,
        spec: BoundedSpec {
            value: Some(value),
            min,
            max: None,
        },
        vary: true,
    }
}

const ASYMMETRIC_HINTS: [ParamHint; 5] = [
    hint("amplitude", 100.0, Some(0.0)),
    hint("center", 100.0, Some(0.0)),
    hint("sigma", 0.2, Some(0.0)),
    hint("sigma_r", 0.02, None),
    hint("gaussian_sigma", 0.2, Some(0.0)),
];

const SHIRLEY_HINTS: [ParamHint; 3] = [
    hint("offset_low", 0.0, None),
    hint("offset_high", 0.0, None),
    ParamHint {
        vary: false,
        ..hint("avg_width", 5.0, Some(1.0))
    },
];

const VOIGT_HINTS: [ParamHint; 4] = [
    hint("amplitude", 100.0, Some(0.0)),
    hint("center", 100.0, Some(0.0)),
    hint("sigma", 0.2, Some(0.0)),
    hint("gamma", 0.2, Some(0.0)),
];

/// A spectral line shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineShape {
    /// Split Lorentzian convolved with a Gaussian, peak height `amplitude`
    AsymmetricConvolvedPeak,
    /// Iterative Shirley background computed from the observed intensity
    ShirleyBackground(ShirleyConfig),
    /// Pseudo-Voigt with area `amplitude`
    Voigt,
}

impl LineShape {
    /// Every registered shape, in picker order.
    pub fn available() -> &'static [LineShape] {
        const SHAPES: [LineShape; 3] = [
            LineShape::ShirleyBackground(ShirleyConfig::DEFAULT),
            LineShape::Voigt,
            LineShape::AsymmetricConvolvedPeak,
        ];
        &SHAPES
    }

    /// Look a shape up by display name or snake-case identifier.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim() {
            "CasaLA" | "asymmetric_convolved_peak" => Ok(LineShape::AsymmetricConvolvedPeak),
            "Shirley background" | "shirley_background" => {
                Ok(LineShape::ShirleyBackground(ShirleyConfig::DEFAULT))
            }
            "Voigt" | "voigt" => Ok(LineShape::Voigt),
            other => Err(PeakFitError::NotFound(format!("line shape '{}'", other))),
        }
    }

    /// Name shown to users.
    pub fn display_name(&self) -> &'static str {
        match self {
            LineShape::AsymmetricConvolvedPeak => "CasaLA",
            LineShape::ShirleyBackground(_) => "Shirley background",
            LineShape::Voigt => "Voigt",
        }
    }

    /// Parameter hints in evaluation order.
    pub fn param_hints(&self) -> &'static [ParamHint] {
        match self {
            LineShape::AsymmetricConvolvedPeak => &ASYMMETRIC_HINTS,
            LineShape::ShirleyBackground(_) => &SHIRLEY_HINTS,
            LineShape::Voigt => &VOIGT_HINTS,
        }
    }

    /// Independent variables the shape reads.
    pub fn required_vars(&self) -> &'static [IndependentVar] {
        match self {
            LineShape::ShirleyBackground(_) => &[IndependentVar::X, IndependentVar::Y],
            _ => &[IndependentVar::X],
        }
    }

    /// Whether this shape models a background rather than a peak.
    pub fn is_background(&self) -> bool {
        matches!(self, LineShape::ShirleyBackground(_))
    }

    /// Evaluate the shape with `values` given in [`param_hints`](Self::param_hints) order.
    ///
    /// `y` must be supplied for shapes that need it and must match `x` in length.
    pub fn evaluate(
        &self,
        values: &[f64],
        x: ArrayView1<f64>,
        y: Option<ArrayView1<f64>>,
    ) -> Result<Array1<f64>> {
        let expected = self.param_hints().len();
        if values.len() != expected {
            return Err(PeakFitError::DimensionMismatch(format!(
                "{} takes {} parameters, got {}",
                self.display_name(),
                expected,
                values.len()
            )));
        }

        match *self {
            LineShape::AsymmetricConvolvedPeak => Ok(asymmetric::split_lorentz_conv_gauss(
                x, values[0], values[1], values[2], values[3], values[4],
            )),
            LineShape::ShirleyBackground(config) => {
                let y = y.ok_or_else(|| PeakFitError::MissingIndependentVariable {
                    component: self.display_name().to_string(),
                    variable: IndependentVar::Y.name().to_string(),
                })?;
                shirley::shirley_background(x, y, values[0], values[1], values[2], &config)
            }
            LineShape::Voigt => Ok(voigt::voigt(x, values[0], values[1], values[2], values[3])),
        }
    }

    /// Read-only quantities derived from the parameter values.
    pub fn derived(&self, values: &[f64]) -> Vec<(&'static str, f64)> {
        match (self, values) {
            (LineShape::AsymmetricConvolvedPeak, [_, _, _, _, gaussian_sigma]) => {
                vec![("gaussian_fwhm", asymmetric::gaussian_fwhm(*gaussian_sigma))]
            }
            (LineShape::Voigt, [amplitude, _, sigma, gamma]) => vec![
                ("fwhm", voigt::fwhm(*sigma, *gamma)),
                ("height", voigt::height(*amplitude, *sigma, *gamma)),
            ],
            _ => Vec::new(),
        }
    }

    /// Starting values and search boxes derived from a peak estimate.
    /// Backgrounds have none.
    ///
    /// Widths get `[0, 4·seed]`, amplitudes `[0, 2·seed]` and the centre one
    /// FWHM either side of the estimate.
    pub fn seed(&self, estimate: &PeakEstimate) -> Vec<ParamSeed> {
        let left = estimate.fwhm_left;
        let right = estimate.fwhm_right;
        let width = left + right;
        let center = ParamSeed::new("center", estimate.center, estimate.center - width, estimate.center + width);
        match self {
            LineShape::AsymmetricConvolvedPeak => vec![
                ParamSeed::scale("amplitude", estimate.amplitude),
                center,
                ParamSeed::width("sigma", 0.5 * left),
                ParamSeed::width("sigma_r", 0.5 * right),
                ParamSeed::width("gaussian_sigma", width / (4.0 * asymmetric::GAUSSIAN_HWHM_FACTOR)),
            ],
            LineShape::Voigt => vec![
                ParamSeed::scale("amplitude", 1.3 * estimate.amplitude * width),
                center,
                ParamSeed::width("sigma", width / (4.0 * asymmetric::GAUSSIAN_HWHM_FACTOR)),
                ParamSeed::width("gamma", 0.25 * width),
            ],
            LineShape::ShirleyBackground(_) => Vec::new(),
        }
    }
}

/// Starting value for one parameter together with the box a fit from it
/// should be allowed to search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSeed {
    /// Unprefixed parameter name
    pub name: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl ParamSeed {
    fn new(name: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self { name, value, min, max }
    }

    fn width(name: &'static str, value: f64) -> Self {
        Self::new(name, value, 0.0, 4.0 * value)
    }

    fn scale(name: &'static str, value: f64) -> Self {
        Self::new(name, value, 0.0, 2.0 * value)
    }

    /// Whether the value and box are usable.
    pub fn is_valid(&self) -> bool {
        self.value.is_finite() && self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

impl std::fmt::Display for LineShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
