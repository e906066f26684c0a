//! Pipeline policy
//!
//! The two registration-sheet layouts seen in production share one pipeline.
//! `PipelineConfig` selects the per-layout policies: which promotion-name
//! rewrite rule runs, how consolidation groups rows, whether zero-quantity
//! rows are dropped, and whether the cost finalizer runs.
//!
//! A preset is picked by [`Variant`]; individual fields can then be overridden
//! from a YAML profile file:
//!
//! ```yaml
//! preset: unit-cost
//! accounting_unit: SAL
//! department: 20066
//! columns:
//!   model: "Model(Editable)"
//! ```

use crate::error::{SalesPgmError, SalesPgmResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sheet layout preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Plain quantity sheet: promotion codes appended, all duplicates merged
    Standard,
    /// Sheet with per-unit amounts: costs recomputed, column order restored
    UnitCost,
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::UnitCost => "unit-cost",
        }
    }
}

/// Column headers the pipeline reads and writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnNames {
    pub customer: String,
    pub model: String,
    pub promotion: String,
    pub quantity: String,
    pub apply_from: String,
    pub apply_to: String,
    pub unit_amount: String,
    pub sales_program: String,
    pub registration_date: String,
    pub accounting_unit: String,
    pub department: String,
    pub apply_month: String,
    pub expected_cost: String,
}

impl ColumnNames {
    fn for_variant(variant: Variant) -> Self {
        Self {
            customer: "Customer Name".to_string(),
            model: match variant {
                Variant::Standard => "Model".to_string(),
                Variant::UnitCost => "Model(Editable)".to_string(),
            },
            promotion: "Promotion Name".to_string(),
            quantity: "Expected QTY(Editable)".to_string(),
            apply_from: "Apply Date(From)".to_string(),
            apply_to: "Apply Date(To)".to_string(),
            unit_amount: "Amount Per Unit".to_string(),
            sales_program: "Sales PGM Name(Editable)".to_string(),
            // Spelled the way the accounting upload template spells it
            registration_date: "Registration Requeste Date(Editable)".to_string(),
            accounting_unit: "Accounting Unit(Editable)".to_string(),
            department: "Department(Editable)".to_string(),
            apply_month: "Apply Month(Editable)".to_string(),
            expected_cost: "Expected Cost".to_string(),
        }
    }
}

/// Customer-name markers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    /// Customer name fragment identifying aggregator rows
    pub aggregator: String,
    /// Retail brand name rewritten to `abbreviation` in sales program names
    pub brand: String,
    /// One-space spelling of `brand` also seen in customer names
    pub brand_spaced: String,
    pub abbreviation: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            aggregator: "MEDIAMARKT SATURN".to_string(),
            brand: "MEDIAMARKT".to_string(),
            brand_spaced: "MEDIA MARKT".to_string(),
            abbreviation: "MM".to_string(),
        }
    }
}

/// How the sales program name is built from the promotion name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteRule {
    /// `{prefix} MM {store} - {code} - NP - E`
    CodeSuffix,
    /// Strip `- Z<digits>`, abbreviate the brand, insert the store after it
    CustomerInsert,
}

/// Source of the Apply Month column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplyMonthRule {
    /// YYYYMM of Apply Date(To)
    ApplyDateTo,
    /// YYYYMM of the processing date
    ProcessingMonth,
    /// Literal value written to every row
    Fixed(String),
}

/// Consolidation grouping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingKey {
    /// (model, promotion, year from, year to); every duplicate merges
    ModelPromotionYears,
    /// Adds the unit amount; rows merge only when their amounts agree
    ModelPromotionYearsUnitAmount,
}

impl GroupingKey {
    pub fn uses_unit_amount(&self) -> bool {
        matches!(self, GroupingKey::ModelPromotionYearsUnitAmount)
    }
}

/// Complete policy for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub variant: Variant,
    pub columns: ColumnNames,
    pub markers: Markers,
    pub rewrite: RewriteRule,
    pub apply_month: ApplyMonthRule,
    pub accounting_unit: String,
    pub department: i64,
    /// Aggregator quantities above this are split evenly
    pub even_split_threshold: i64,
    /// Drop every zero-quantity row after redistribution
    pub drop_zero_quantity: bool,
    pub grouping: GroupingKey,
    /// Rows of the retail brand are never consolidated
    pub skip_brand_in_consolidation: bool,
    /// Recompute Expected Cost and restore the input column order
    pub finalize_costs: bool,
}

impl PipelineConfig {
    pub fn preset(variant: Variant) -> Self {
        match variant {
            Variant::Standard => Self::standard(),
            Variant::UnitCost => Self::unit_cost(),
        }
    }

    pub fn standard() -> Self {
        Self {
            variant: Variant::Standard,
            columns: ColumnNames::for_variant(Variant::Standard),
            markers: Markers::default(),
            rewrite: RewriteRule::CodeSuffix,
            apply_month: ApplyMonthRule::ApplyDateTo,
            accounting_unit: "SAL".to_string(),
            department: 20066,
            even_split_threshold: 11,
            drop_zero_quantity: true,
            grouping: GroupingKey::ModelPromotionYears,
            skip_brand_in_consolidation: true,
            finalize_costs: false,
        }
    }

    pub fn unit_cost() -> Self {
        Self {
            variant: Variant::UnitCost,
            columns: ColumnNames::for_variant(Variant::UnitCost),
            markers: Markers::default(),
            rewrite: RewriteRule::CustomerInsert,
            apply_month: ApplyMonthRule::ProcessingMonth,
            accounting_unit: "SAL".to_string(),
            department: 20066,
            even_split_threshold: 11,
            drop_zero_quantity: false,
            grouping: GroupingKey::ModelPromotionYearsUnitAmount,
            skip_brand_in_consolidation: true,
            finalize_costs: true,
        }
    }

    /// Columns whose absence is a structural input error
    pub fn required_columns(&self) -> Vec<&str> {
        let c = &self.columns;
        let mut required = vec![
            c.customer.as_str(),
            c.model.as_str(),
            c.promotion.as_str(),
            c.quantity.as_str(),
            c.apply_from.as_str(),
            c.apply_to.as_str(),
        ];
        if self.grouping.uses_unit_amount() || self.finalize_costs {
            required.push(c.unit_amount.as_str());
        }
        required
    }

    /// Load a YAML profile. `fallback` is used when the file names no preset.
    pub fn from_profile_file(path: &Path, fallback: Variant) -> SalesPgmResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_profile_str(&content, fallback)
    }

    pub fn from_profile_str(yaml: &str, fallback: Variant) -> SalesPgmResult<Self> {
        let profile: Profile = serde_yaml::from_str(yaml)?;
        profile.into_config(fallback)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

//==============================================================================
// Profile files
//==============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ColumnOverrides {
    customer: Option<String>,
    model: Option<String>,
    promotion: Option<String>,
    quantity: Option<String>,
    apply_from: Option<String>,
    apply_to: Option<String>,
    unit_amount: Option<String>,
    sales_program: Option<String>,
    registration_date: Option<String>,
    accounting_unit: Option<String>,
    department: Option<String>,
    apply_month: Option<String>,
    expected_cost: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Profile {
    preset: Option<Variant>,
    columns: ColumnOverrides,
    markers: Option<Markers>,
    rewrite: Option<RewriteRule>,
    apply_month: Option<ApplyMonthRule>,
    accounting_unit: Option<String>,
    department: Option<i64>,
    even_split_threshold: Option<i64>,
    drop_zero_quantity: Option<bool>,
    grouping: Option<GroupingKey>,
    skip_brand_in_consolidation: Option<bool>,
    finalize_costs: Option<bool>,
}

fn apply(slot: &mut String, value: Option<String>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl Profile {
    fn into_config(self, fallback: Variant) -> SalesPgmResult<PipelineConfig> {
        let mut config = PipelineConfig::preset(self.preset.unwrap_or(fallback));

        let cols = self.columns;
        let c = &mut config.columns;
        apply(&mut c.customer, cols.customer);
        apply(&mut c.model, cols.model);
        apply(&mut c.promotion, cols.promotion);
        apply(&mut c.quantity, cols.quantity);
        apply(&mut c.apply_from, cols.apply_from);
        apply(&mut c.apply_to, cols.apply_to);
        apply(&mut c.unit_amount, cols.unit_amount);
        apply(&mut c.sales_program, cols.sales_program);
        apply(&mut c.registration_date, cols.registration_date);
        apply(&mut c.accounting_unit, cols.accounting_unit);
        apply(&mut c.department, cols.department);
        apply(&mut c.apply_month, cols.apply_month);
        apply(&mut c.expected_cost, cols.expected_cost);

        if let Some(markers) = self.markers {
            config.markers = markers;
        }
        if let Some(rewrite) = self.rewrite {
            config.rewrite = rewrite;
        }
        if let Some(apply_month) = self.apply_month {
            config.apply_month = apply_month;
        }
        apply(&mut config.accounting_unit, self.accounting_unit);
        if let Some(department) = self.department {
            config.department = department;
        }
        if let Some(threshold) = self.even_split_threshold {
            config.even_split_threshold = threshold;
        }
        if let Some(drop) = self.drop_zero_quantity {
            config.drop_zero_quantity = drop;
        }
        if let Some(grouping) = self.grouping {
            config.grouping = grouping;
        }
        if let Some(skip) = self.skip_brand_in_consolidation {
            config.skip_brand_in_consolidation = skip;
        }
        if let Some(finalize) = self.finalize_costs {
            config.finalize_costs = finalize;
        }

        if config.markers.aggregator.trim().is_empty() || config.markers.brand.trim().is_empty() {
            return Err(SalesPgmError::Config(
                "markers.aggregator and markers.brand must not be empty".to_string(),
            ));
        }
        if config.even_split_threshold < 0 {
            return Err(SalesPgmError::Config(format!(
                "even_split_threshold must be >= 0, got {}",
                config.even_split_threshold
            )));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_preset() {
        let config = PipelineConfig::standard();
        assert_eq!(config.columns.model, "Model");
        assert_eq!(config.rewrite, RewriteRule::CodeSuffix);
        assert!(config.drop_zero_quantity);
        assert!(!config.finalize_costs);
        assert!(!config.required_columns().contains(&"Amount Per Unit"));
    }

    #[test]
    fn test_unit_cost_preset_requires_amount() {
        let config = PipelineConfig::unit_cost();
        assert_eq!(config.columns.model, "Model(Editable)");
        assert!(config.required_columns().contains(&"Amount Per Unit"));
        assert!(config.finalize_costs);
        assert!(!config.drop_zero_quantity);
    }

    #[test]
    fn test_profile_overrides_preset_fields() {
        let yaml = r#"
preset: unit-cost
accounting_unit: ACC
department: 1234
apply_month:
  fixed: "202501"
columns:
  customer: "Customer"
"#;
        let config = PipelineConfig::from_profile_str(yaml, Variant::Standard).unwrap();
        assert_eq!(config.variant, Variant::UnitCost);
        assert_eq!(config.accounting_unit, "ACC");
        assert_eq!(config.department, 1234);
        assert_eq!(config.apply_month, ApplyMonthRule::Fixed("202501".to_string()));
        assert_eq!(config.columns.customer, "Customer");
        assert_eq!(config.columns.model, "Model(Editable)");
    }

    #[test]
    fn test_profile_falls_back_to_given_variant() {
        let config = PipelineConfig::from_profile_str("drop_zero_quantity: false", Variant::Standard)
            .unwrap();
        assert_eq!(config.variant, Variant::Standard);
        assert!(!config.drop_zero_quantity);
    }

    #[test]
    fn test_profile_rejects_unknown_fields() {
        let result = PipelineConfig::from_profile_str("colour: red", Variant::Standard);
        assert!(matches!(result, Err(SalesPgmError::Yaml(_))));
    }

    #[test]
    fn test_profile_rejects_negative_threshold() {
        let result = PipelineConfig::from_profile_str("even_split_threshold: -1", Variant::Standard);
        assert!(matches!(result, Err(SalesPgmError::Config(_))));
    }
}
