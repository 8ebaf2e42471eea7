//! Field selectors: which nodal quantity to pull out of a solved result set

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BeamSimError, SimResult};

/// Global coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Column index in an (x, y, z) triple
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

/// Independent components of the Cauchy stress tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StressComponent {
    X,
    Y,
    Z,
    XY,
    YZ,
    XZ,
}

impl StressComponent {
    pub const ALL: [StressComponent; 6] = [
        StressComponent::X,
        StressComponent::Y,
        StressComponent::Z,
        StressComponent::XY,
        StressComponent::YZ,
        StressComponent::XZ,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StressComponent::X => "X",
            StressComponent::Y => "Y",
            StressComponent::Z => "Z",
            StressComponent::XY => "XY",
            StressComponent::YZ => "YZ",
            StressComponent::XZ => "XZ",
        }
    }
}

/// Principal stress index, ordered algebraically (1 = largest, 3 = smallest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrincipalIndex {
    First,
    Second,
    Third,
}

impl PrincipalIndex {
    /// Position in a descending-sorted principal triple
    pub fn index(self) -> usize {
        match self {
            PrincipalIndex::First => 0,
            PrincipalIndex::Second => 1,
            PrincipalIndex::Third => 2,
        }
    }
}

/// Physical quantity of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldLabel {
    Displacement,
    Stress,
}

impl FieldLabel {
    /// Short solver-style label
    pub fn as_str(self) -> &'static str {
        match self {
            FieldLabel::Displacement => "U",
            FieldLabel::Stress => "S",
        }
    }
}

impl fmt::Display for FieldLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldLabel {
    type Err = BeamSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "U" | "DISP" | "DISPLACEMENT" => Ok(FieldLabel::Displacement),
            "S" | "STRESS" => Ok(FieldLabel::Stress),
            _ => Err(BeamSimError::UnsupportedLabel(s.to_string())),
        }
    }
}

/// Component of a field: a single axis or a derived invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    /// Single global axis
    Axis(Axis),
    /// Euclidean norm of the displacement vector ("SUM")
    Magnitude,
    /// Principal stress #1 ("1")
    Principal1,
    /// Principal stress #3 ("3")
    Principal3,
    /// von Mises equivalent stress ("EQV")
    Equivalent,
}

impl Component {
    pub fn as_str(self) -> &'static str {
        match self {
            Component::Axis(axis) => axis.as_str(),
            Component::Magnitude => "SUM",
            Component::Principal1 => "1",
            Component::Principal3 => "3",
            Component::Equivalent => "EQV",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated (label, component) pair.
///
/// Only these combinations exist:
///
/// | label | components        |
/// |-------|-------------------|
/// | U     | SUM, X, Y, Z      |
/// | S     | 1, 3, EQV         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSelector {
    label: FieldLabel,
    component: Component,
}

impl FieldSelector {
    /// Validate a component spelling against a label
    pub fn new(label: FieldLabel, component: &str) -> SimResult<Self> {
        let key = component.trim().to_ascii_uppercase();
        let component = match (label, key.as_str()) {
            (FieldLabel::Displacement, "SUM") => Component::Magnitude,
            (FieldLabel::Displacement, "X") => Component::Axis(Axis::X),
            (FieldLabel::Displacement, "Y") => Component::Axis(Axis::Y),
            (FieldLabel::Displacement, "Z") => Component::Axis(Axis::Z),
            (FieldLabel::Stress, "1") => Component::Principal1,
            (FieldLabel::Stress, "3") => Component::Principal3,
            (FieldLabel::Stress, "EQV") => Component::Equivalent,
            _ => {
                return Err(BeamSimError::UnsupportedComponent {
                    label: label.to_string(),
                    component: component.to_string(),
                })
            }
        };
        Ok(Self { label, component })
    }

    /// Parse both halves from their string spellings. The label is checked first.
    pub fn parse(label: &str, component: &str) -> SimResult<Self> {
        let label: FieldLabel = label.parse()?;
        Self::new(label, component)
    }

    pub fn displacement_magnitude() -> Self {
        Self {
            label: FieldLabel::Displacement,
            component: Component::Magnitude,
        }
    }

    pub fn displacement(axis: Axis) -> Self {
        Self {
            label: FieldLabel::Displacement,
            component: Component::Axis(axis),
        }
    }

    pub fn max_principal_stress() -> Self {
        Self {
            label: FieldLabel::Stress,
            component: Component::Principal1,
        }
    }

    pub fn min_principal_stress() -> Self {
        Self {
            label: FieldLabel::Stress,
            component: Component::Principal3,
        }
    }

    pub fn von_mises() -> Self {
        Self {
            label: FieldLabel::Stress,
            component: Component::Equivalent,
        }
    }

    pub fn label(&self) -> FieldLabel {
        self.label
    }

    pub fn component(&self) -> Component {
        self.component
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.label, self.component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_selectors() {
        let sel = FieldSelector::parse("U", "sum").unwrap();
        assert_eq!(sel, FieldSelector::displacement_magnitude());

        let sel = FieldSelector::parse("displacement", "X").unwrap();
        assert_eq!(sel, FieldSelector::displacement(Axis::X));

        let sel = FieldSelector::parse("S", "EQV").unwrap();
        assert_eq!(sel, FieldSelector::von_mises());

        let sel = FieldSelector::parse("stress", "3").unwrap();
        assert_eq!(sel.component(), Component::Principal3);
    }

    #[test]
    fn test_unknown_component_for_displacement() {
        let err = FieldSelector::parse("U", "Q").unwrap_err();
        assert!(matches!(err, BeamSimError::UnsupportedComponent { .. }));
    }

    #[test]
    fn test_stress_rejects_displacement_components() {
        for comp in ["SUM", "X", "2", "XY"] {
            let err = FieldSelector::parse("S", comp).unwrap_err();
            assert!(
                matches!(err, BeamSimError::UnsupportedComponent { .. }),
                "S:{comp} should be rejected"
            );
        }
    }

    #[test]
    fn test_unknown_label_wins_over_component() {
        let err = FieldSelector::parse("Torque", "X").unwrap_err();
        match err {
            BeamSimError::UnsupportedLabel(label) => assert_eq!(label, "Torque"),
            other => panic!("expected UnsupportedLabel, got {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldSelector::von_mises().to_string(), "S:EQV");
        assert_eq!(FieldSelector::displacement(Axis::Z).to_string(), "U:Z");
    }
}
