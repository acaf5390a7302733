use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealerdesk_core::{DomainError, DomainResult, Entity, RuleId, ValueObject};

/// One selectable width/height pair of a rule.
///
/// Fixed-height options are stocked in units; optional-height options are
/// stocked by area and get their height from the operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SizeOptionRecord", into = "SizeOptionRecord")]
pub enum SizeOption {
    Fixed {
        /// Centimeters.
        width: Decimal,
        /// Centimeters.
        height: Decimal,
        stock_quantity: u32,
    },
    OptionalHeight {
        /// Centimeters.
        width: Decimal,
        stock_area_m2: Decimal,
    },
}

impl ValueObject for SizeOption {}

impl SizeOption {
    pub fn fixed(width: Decimal, height: Decimal, stock_quantity: u32) -> DomainResult<Self> {
        ensure_positive("width", width)?;
        ensure_positive("height", height)?;
        Ok(Self::Fixed {
            width,
            height,
            stock_quantity,
        })
    }

    pub fn optional_height(width: Decimal, stock_area_m2: Decimal) -> DomainResult<Self> {
        ensure_positive("width", width)?;
        if stock_area_m2.is_sign_negative() {
            return Err(DomainError::validation("stockAreaM2 cannot be negative"));
        }
        Ok(Self::OptionalHeight {
            width,
            stock_area_m2,
        })
    }

    pub fn width(&self) -> Decimal {
        match self {
            SizeOption::Fixed { width, .. } | SizeOption::OptionalHeight { width, .. } => *width,
        }
    }

    /// Catalog height, `None` for optional-height options.
    pub fn fixed_height(&self) -> Option<Decimal> {
        match self {
            SizeOption::Fixed { height, .. } => Some(*height),
            SizeOption::OptionalHeight { .. } => None,
        }
    }

    pub fn is_optional_height(&self) -> bool {
        matches!(self, SizeOption::OptionalHeight { .. })
    }

    pub fn stock_quantity(&self) -> Option<u32> {
        match self {
            SizeOption::Fixed { stock_quantity, .. } => Some(*stock_quantity),
            SizeOption::OptionalHeight { .. } => None,
        }
    }

    pub fn stock_area_m2(&self) -> Option<Decimal> {
        match self {
            SizeOption::Fixed { .. } => None,
            SizeOption::OptionalHeight { stock_area_m2, .. } => Some(*stock_area_m2),
        }
    }

    /// Short label for dropdowns and log lines, e.g. `200 x 300` or `150 x ?`.
    pub fn label(&self) -> String {
        match self {
            SizeOption::Fixed { width, height, .. } => {
                format!("{} x {}", width.normalize(), height.normalize())
            }
            SizeOption::OptionalHeight { width, .. } => format!("{} x ?", width.normalize()),
        }
    }
}

fn ensure_positive(field: &str, value: Decimal) -> DomainResult<()> {
    if value <= Decimal::ZERO {
        return Err(DomainError::validation(format!("{field} must be positive")));
    }
    Ok(())
}

/// Collaborator wire shape of a size option.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SizeOptionRecord {
    width: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<Decimal>,
    #[serde(default)]
    is_optional_height: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stock_quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stock_area_m2: Option<Decimal>,
}

impl TryFrom<SizeOptionRecord> for SizeOption {
    type Error = DomainError;

    fn try_from(record: SizeOptionRecord) -> Result<Self, Self::Error> {
        if record.is_optional_height {
            return SizeOption::optional_height(
                record.width,
                record.stock_area_m2.unwrap_or(Decimal::ZERO),
            );
        }

        let height = record
            .height
            .ok_or_else(|| DomainError::validation("fixed size option is missing height"))?;
        let stock_quantity = match record.stock_quantity.unwrap_or(0) {
            n if n < 0 => return Err(DomainError::validation("stockQuantity cannot be negative")),
            n => u32::try_from(n)
                .map_err(|_| DomainError::validation("stockQuantity out of range"))?,
        };
        SizeOption::fixed(record.width, height, stock_quantity)
    }
}

impl From<SizeOption> for SizeOptionRecord {
    fn from(option: SizeOption) -> Self {
        match option {
            SizeOption::Fixed {
                width,
                height,
                stock_quantity,
            } => Self {
                width,
                height: Some(height),
                is_optional_height: false,
                stock_quantity: Some(i64::from(stock_quantity)),
                stock_area_m2: None,
            },
            SizeOption::OptionalHeight {
                width,
                stock_area_m2,
            } => Self {
                width,
                height: None,
                is_optional_height: true,
                stock_quantity: None,
                stock_area_m2: Some(stock_area_m2),
            },
        }
    }
}

/// Canonical cutting styles understood by the cart collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CutKind {
    Rectangle,
    Oval,
    Round,
    Custom,
    PostCut,
}

impl CutKind {
    pub const ALL: [CutKind; 5] = [
        CutKind::Rectangle,
        CutKind::Oval,
        CutKind::Round,
        CutKind::Custom,
        CutKind::PostCut,
    ];

    /// Value sent in `cutType` of a cart-line request.
    pub fn wire_value(self) -> &'static str {
        match self {
            CutKind::Rectangle => "rectangle",
            CutKind::Oval => "oval",
            CutKind::Round => "round",
            CutKind::Custom => "custom",
            CutKind::PostCut => "post-cut",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CutKind::Rectangle => "Rectangular",
            CutKind::Oval => "Oval",
            CutKind::Round => "Round",
            CutKind::Custom => "Custom",
            CutKind::PostCut => "Post-cut",
        }
    }

    /// Resolve a catalog identifier or display name to a kind.
    ///
    /// Case-insensitive; `-`, `_` and spaces are ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "rectangle" | "rectangular" | "rect" => Some(CutKind::Rectangle),
            "oval" | "ellipse" => Some(CutKind::Oval),
            "round" | "circle" | "circular" => Some(CutKind::Round),
            "custom" | "special" => Some(CutKind::Custom),
            "postcut" => Some(CutKind::PostCut),
            _ => None,
        }
    }
}

impl core::fmt::Display for CutKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.wire_value())
    }
}

/// A named cutting style offered by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CutTypeRecord")]
pub struct CutType {
    id: String,
    name: String,
    kind: CutKind,
}

impl ValueObject for CutType {}

impl CutType {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: CutKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    /// Cut type named after its canonical kind.
    pub fn canonical(kind: CutKind) -> Self {
        Self::new(kind.wire_value(), kind.display_name(), kind)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CutKind {
        self.kind
    }
}

/// Collaborator wire shape of a cut type. `kind` is optional; when absent the
/// identifier, then the name, is used to resolve it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CutTypeRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

impl TryFrom<CutTypeRecord> for CutType {
    type Error = DomainError;

    fn try_from(record: CutTypeRecord) -> Result<Self, Self::Error> {
        let name = record.name.unwrap_or_else(|| record.id.clone());
        let kind = record
            .kind
            .as_deref()
            .and_then(CutKind::from_label)
            .or_else(|| CutKind::from_label(&record.id))
            .or_else(|| CutKind::from_label(&name))
            .ok_or_else(|| {
                DomainError::validation(format!("unknown cut type `{}` ({name})", record.id))
            })?;
        Ok(CutType {
            id: record.id,
            name,
            kind,
        })
    }
}

/// Convert wire cut types, dropping the ones whose kind cannot be resolved.
pub(crate) fn resolve_cut_types(records: Vec<CutTypeRecord>) -> Vec<CutType> {
    records
        .into_iter()
        .filter_map(|record| match CutType::try_from(record) {
            Ok(cut) => Some(cut),
            Err(err) => {
                tracing::warn!(error = %err, "dropping cut type with no canonical kind");
                None
            }
        })
        .collect()
}

/// Deserialize a cut type list leniently (see [`resolve_cut_types`]).
pub(crate) fn deserialize_cut_types<'de, D>(deserializer: D) -> Result<Vec<CutType>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let records = Vec::<CutTypeRecord>::deserialize(deserializer)?;
    Ok(resolve_cut_types(records))
}

/// Convert wire size options, dropping the ones that fail validation.
fn resolve_size_options(records: Vec<SizeOptionRecord>) -> Vec<SizeOption> {
    records
        .into_iter()
        .filter_map(|record| {
            let width = record.width;
            match SizeOption::try_from(record) {
                Ok(size) => Some(size),
                Err(err) => {
                    tracing::warn!(%width, error = %err, "dropping malformed size option");
                    None
                }
            }
        })
        .collect()
}

/// Deserialize a size option list leniently (see [`resolve_size_options`]).
pub(crate) fn deserialize_size_options<'de, D>(
    deserializer: D,
) -> Result<Vec<SizeOption>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let records = Vec::<SizeOptionRecord>::deserialize(deserializer)?;
    Ok(resolve_size_options(records))
}

/// Configuration constraints of a product family.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ProductRuleRecord")]
pub struct ProductRule {
    id: RuleId,
    size_options: Vec<SizeOption>,
    cut_types: Vec<CutType>,
    can_have_fringe: bool,
}

impl ProductRule {
    /// Build a rule; both option lists must be non-empty.
    pub fn new(
        id: RuleId,
        size_options: Vec<SizeOption>,
        cut_types: Vec<CutType>,
        can_have_fringe: bool,
    ) -> DomainResult<Self> {
        if size_options.is_empty() {
            return Err(DomainError::invariant(format!("rule {id} has no size options")));
        }
        if cut_types.is_empty() {
            return Err(DomainError::invariant(format!("rule {id} has no cut types")));
        }
        Ok(Self::unchecked(id, size_options, cut_types, can_have_fringe))
    }

    /// Skips the non-empty checks; only the permissive fallback uses this.
    pub(crate) fn unchecked(
        id: RuleId,
        size_options: Vec<SizeOption>,
        cut_types: Vec<CutType>,
        can_have_fringe: bool,
    ) -> Self {
        Self {
            id,
            size_options,
            cut_types,
            can_have_fringe,
        }
    }

    pub fn id_typed(&self) -> RuleId {
        self.id
    }

    pub fn size_options(&self) -> &[SizeOption] {
        &self.size_options
    }

    pub fn cut_types(&self) -> &[CutType] {
        &self.cut_types
    }

    pub fn can_have_fringe(&self) -> bool {
        self.can_have_fringe
    }

    pub fn has_size(&self, size: &SizeOption) -> bool {
        self.size_options.contains(size)
    }

    pub fn has_cut_type(&self, cut: &CutType) -> bool {
        self.cut_types.contains(cut)
    }

    pub fn cut_type_by_id(&self, id: &str) -> Option<&CutType> {
        self.cut_types.iter().find(|c| c.id == id)
    }

    pub fn cut_type_by_kind(&self, kind: CutKind) -> Option<&CutType> {
        self.cut_types.iter().find(|c| c.kind == kind)
    }
}

impl Entity for ProductRule {
    type Id = RuleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRuleRecord {
    #[serde(alias = "id")]
    rule_id: RuleId,
    #[serde(deserialize_with = "deserialize_size_options")]
    size_options: Vec<SizeOption>,
    #[serde(deserialize_with = "deserialize_cut_types")]
    cut_types: Vec<CutType>,
    #[serde(default)]
    can_have_fringe: bool,
}

impl TryFrom<ProductRuleRecord> for ProductRule {
    type Error = DomainError;

    fn try_from(record: ProductRuleRecord) -> Result<Self, Self::Error> {
        ProductRule::new(
            record.rule_id,
            record.size_options,
            record.cut_types,
            record.can_have_fringe,
        )
    }
}
