//! Measurement units for ingredients and recipe items.
//!
//! Units come from a fixed vocabulary grouped by [`Dimension`]. Quantities can
//! be converted between units of the same dimension; a recipe item measured in
//! grams can consume an ingredient priced per kilogram.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing or converting a [`MeasurementUnit`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// The code is not part of the unit vocabulary.
    #[error("unsupported measurement unit: {0}")]
    Unsupported(String),
    /// The two units measure different things (e.g., grams vs. liters).
    #[error("cannot convert {from} to {to}: incompatible dimensions")]
    Incompatible {
        /// Unit being converted from.
        from: MeasurementUnit,
        /// Unit being converted to.
        to: MeasurementUnit,
    },
    /// The converted quantity does not fit in a decimal.
    #[error("{quantity} {from} is out of range in {to}")]
    OutOfRange {
        /// Quantity being converted.
        quantity: Decimal,
        /// Unit being converted from.
        from: MeasurementUnit,
        /// Unit being converted to.
        to: MeasurementUnit,
    },
}

/// Physical dimension a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Mass,
    Volume,
    Unit,
    Length,
    Area,
    Portion,
}

/// A normalized measurement unit code.
///
/// Serializes as its lowercase code (`"kg"`, `"ml"`, `"un"`, ...). Parsing
/// accepts common aliases such as `"kilogram"`, `"litre"` or `"pcs"`.
///
/// ```
/// use recipe_cost_core::{Dimension, MeasurementUnit};
///
/// let unit = MeasurementUnit::parse("Kilograms").unwrap();
/// assert_eq!(unit, MeasurementUnit::Kg);
/// assert_eq!(unit.dimension(), Dimension::Mass);
/// assert!(MeasurementUnit::parse("furlong").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum MeasurementUnit {
    Mg,
    G,
    Kg,
    Oz,
    Lb,
    Ml,
    Cl,
    Dl,
    L,
    Tsp,
    Tbsp,
    Cup,
    Un,
    Dz,
    Mm,
    Cm,
    M,
    Cm2,
    M2,
    Portion,
}

impl MeasurementUnit {
    /// Every unit in the vocabulary.
    pub const ALL: [Self; 20] = [
        Self::Mg,
        Self::G,
        Self::Kg,
        Self::Oz,
        Self::Lb,
        Self::Ml,
        Self::Cl,
        Self::Dl,
        Self::L,
        Self::Tsp,
        Self::Tbsp,
        Self::Cup,
        Self::Un,
        Self::Dz,
        Self::Mm,
        Self::Cm,
        Self::M,
        Self::Cm2,
        Self::M2,
        Self::Portion,
    ];

    /// Parse a unit code or alias, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `UnitError::Unsupported` if the code is not in the vocabulary.
    pub fn parse(s: &str) -> Result<Self, UnitError> {
        let normalized = s.trim().to_lowercase();
        let unit = match normalized.as_str() {
            "mg" | "milligram" | "milligrams" => Self::Mg,
            "g" | "gr" | "gram" | "grams" => Self::G,
            "kg" | "kilo" | "kilogram" | "kilograms" => Self::Kg,
            "oz" | "ounce" | "ounces" => Self::Oz,
            "lb" | "lbs" | "pound" | "pounds" => Self::Lb,
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => Self::Ml,
            "cl" | "centiliter" | "centiliters" => Self::Cl,
            "dl" | "deciliter" | "deciliters" => Self::Dl,
            "l" | "lt" | "liter" | "liters" | "litre" | "litres" => Self::L,
            "tsp" | "teaspoon" | "teaspoons" => Self::Tsp,
            "tbsp" | "tablespoon" | "tablespoons" => Self::Tbsp,
            "cup" | "cups" => Self::Cup,
            "un" | "unit" | "units" | "pc" | "pcs" | "piece" | "pieces" | "ea" => Self::Un,
            "dz" | "dozen" | "dozens" => Self::Dz,
            "mm" | "millimeter" | "millimeters" => Self::Mm,
            "cm" | "centimeter" | "centimeters" => Self::Cm,
            "m" | "meter" | "meters" | "metre" | "metres" => Self::M,
            "cm2" | "cm²" => Self::Cm2,
            "m2" | "m²" => Self::M2,
            "portion" | "portions" | "serving" | "servings" => Self::Portion,
            _ => return Err(UnitError::Unsupported(s.to_owned())),
        };
        Ok(unit)
    }

    /// Returns the normalized code for this unit.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Mg => "mg",
            Self::G => "g",
            Self::Kg => "kg",
            Self::Oz => "oz",
            Self::Lb => "lb",
            Self::Ml => "ml",
            Self::Cl => "cl",
            Self::Dl => "dl",
            Self::L => "l",
            Self::Tsp => "tsp",
            Self::Tbsp => "tbsp",
            Self::Cup => "cup",
            Self::Un => "un",
            Self::Dz => "dz",
            Self::Mm => "mm",
            Self::Cm => "cm",
            Self::M => "m",
            Self::Cm2 => "cm2",
            Self::M2 => "m2",
            Self::Portion => "portion",
        }
    }

    /// Returns the dimension this unit measures.
    #[must_use]
    pub const fn dimension(self) -> Dimension {
        match self {
            Self::Mg | Self::G | Self::Kg | Self::Oz | Self::Lb => Dimension::Mass,
            Self::Ml | Self::Cl | Self::Dl | Self::L | Self::Tsp | Self::Tbsp | Self::Cup => {
                Dimension::Volume
            }
            Self::Un | Self::Dz => Dimension::Unit,
            Self::Mm | Self::Cm | Self::M => Dimension::Length,
            Self::Cm2 | Self::M2 => Dimension::Area,
            Self::Portion => Dimension::Portion,
        }
    }

    /// How many base units (g, ml, un, cm, cm2, portion) one of this unit is.
    ///
    /// Kitchen volumes use metric measures: 5 ml teaspoon, 15 ml tablespoon,
    /// 240 ml cup.
    #[must_use]
    pub fn base_factor(self) -> Decimal {
        match self {
            Self::Mg => Decimal::new(1, 3),
            Self::G | Self::Ml | Self::Un | Self::Cm | Self::Cm2 | Self::Portion => Decimal::ONE,
            Self::Kg | Self::L => Decimal::ONE_THOUSAND,
            Self::Oz => Decimal::new(28_349_523_125, 9),
            Self::Lb => Decimal::new(45_359_237, 5),
            Self::Cl => Decimal::TEN,
            Self::Dl => Decimal::ONE_HUNDRED,
            Self::Tsp => Decimal::new(5, 0),
            Self::Tbsp => Decimal::new(15, 0),
            Self::Cup => Decimal::new(240, 0),
            Self::Dz => Decimal::new(12, 0),
            Self::Mm => Decimal::new(1, 1),
            Self::M => Decimal::ONE_HUNDRED,
            Self::M2 => Decimal::new(10_000, 0),
        }
    }

    /// Convert `quantity` expressed in `self` into `target` units.
    ///
    /// # Errors
    ///
    /// Returns `UnitError::Incompatible` if the units have different dimensions,
    /// or `UnitError::OutOfRange` if the converted quantity overflows.
    pub fn convert(self, quantity: Decimal, target: Self) -> Result<Decimal, UnitError> {
        if self == target {
            return Ok(quantity);
        }
        if self.dimension() != target.dimension() {
            return Err(UnitError::Incompatible {
                from: self,
                to: target,
            });
        }
        quantity
            .checked_mul(self.base_factor())
            .and_then(|base| base.checked_div(target.base_factor()))
            .ok_or(UnitError::OutOfRange {
                quantity,
                from: self,
                to: target,
            })
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for MeasurementUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MeasurementUnit {
    type Error = UnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for MeasurementUnit {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for MeasurementUnit {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for MeasurementUnit {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.code(), buf)
    }
}
