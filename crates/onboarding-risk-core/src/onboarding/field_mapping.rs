use serde::{Deserialize, Serialize};

use super::entity::Attributes;
use super::normalizer::normalize_text;

// ---------------------------------------------------------------------------
// Category names
// ---------------------------------------------------------------------------

pub mod categories {
    pub const FULL_NAME_SANCTION: &str = "Full Name Sanction";
    pub const CUSTOMER_TYPE: &str = "CUSTOMER TYPE";
    pub const PEP: &str = "PEP";
    pub const RESIDENCY_STATUS: &str = "Residency Status";
    pub const NATIONALITY: &str = "Nationality";
    pub const IS_DUAL_NATIONALITY: &str = "Is Dual Nationality";
    pub const DUAL_NATIONALITY_COUNTRIES: &str = "Dual Nationality Countries";
    pub const COUNTRY_OF_BIRTH: &str = "Country of Birth";
    pub const COUNTRY_OF_RESIDENCE: &str = "Country of Residence";
    pub const COUNTRY_OF_INCORPORATION: &str = "Country of Incorporation";
    pub const OCCUPATION: &str = "Occupation";
    pub const EMPLOYMENT_STATUS: &str = "Employment Status";
    pub const BUSINESS_ACTIVITY: &str = "Business Activity";
    pub const LEGAL_FORM: &str = "Legal Form";
    pub const OPERATION_COUNTRIES: &str = "Operation Countries";
    pub const SOURCE_OF_FUNDS: &str = "Source of Funds";
    pub const SOURCE_OF_FUNDS_COUNTRIES: &str = "Source of Funds Countries";
    pub const PRODUCT_TYPE: &str = "Product Type";
    pub const DELIVERY_CHANNEL: &str = "Delivery Channel";
}

// ---------------------------------------------------------------------------
// Canonical attribute names
// ---------------------------------------------------------------------------

pub mod fields {
    pub const CUSTOMER_TYPE: &str = "customerType";
    pub const SHAREHOLDERS: &str = "shareholders";
    pub const FULL_NAME_SANCTION_MATCH: &str = "fullNameSanctionMatch";
    pub const FULL_NAME_SANCTION_MATCH_COUNT: &str = "fullNameSanctionMatchCount";
    pub const PEP: &str = "pep";
    pub const RESIDENCY_STATUS: &str = "residencyStatus";
    pub const NATIONALITY: &str = "nationality";
    pub const IS_DUAL_NATIONALITY: &str = "isDualNationality";
    pub const DUAL_NATIONALITY: &str = "dualNationality";
    pub const COUNTRY_OF_BIRTH: &str = "countryOfBirth";
    pub const COUNTRY_OF_RESIDENCE: &str = "countryOfResidence";
    pub const COUNTRY_OF_INCORPORATION: &str = "countryOfIncorporation";
    pub const OCCUPATION: &str = "occupation";
    pub const EMPLOYMENT_STATUS: &str = "employmentStatus";
    pub const BUSINESS_ACTIVITY: &str = "businessActivity";
    pub const LEGAL_FORM: &str = "legalForm";
    pub const OPERATION_COUNTRIES: &str = "operationCountries";
    pub const SOURCE_OF_FUNDS: &str = "sourceOfFunds";
    pub const SOURCE_OF_FUNDS_COUNTRIES: &str = "sourceOfFundsCountries";
    pub const PRODUCT_TYPE: &str = "productType";
    pub const DELIVERY_CHANNEL: &str = "deliveryChannel";
}

/// Attributes that may carry several values in one field.
pub const MULTI_VALUED_FIELDS: &[&str] = &[
    fields::DUAL_NATIONALITY,
    fields::OPERATION_COUNTRIES,
    fields::SOURCE_OF_FUNDS,
    fields::SOURCE_OF_FUNDS_COUNTRIES,
    fields::BUSINESS_ACTIVITY,
];

// ---------------------------------------------------------------------------
// Archetypes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityArchetype {
    NaturalPerson,
    LegalEntity,
    ShareholderNaturalPerson,
    ShareholderLegalEntity,
}

impl EntityArchetype {
    /// Top-level archetype from a `customerType` value. Unknown types map to
    /// `None`, which the calculator treats as a no-op.
    pub fn from_customer_type(customer_type: &str) -> Option<Self> {
        match normalize_text(customer_type)?.as_str() {
            "natural person" => Some(EntityArchetype::NaturalPerson),
            "legal entities" | "legal entity" => Some(EntityArchetype::LegalEntity),
            _ => None,
        }
    }

    /// Shareholders are legal entities unless declared a natural person.
    pub fn for_shareholder(declared_type: Option<&str>) -> Self {
        match declared_type.and_then(normalize_text).as_deref() {
            Some("natural person") => EntityArchetype::ShareholderNaturalPerson,
            _ => EntityArchetype::ShareholderLegalEntity,
        }
    }

    pub fn is_shareholder(&self) -> bool {
        matches!(
            self,
            EntityArchetype::ShareholderNaturalPerson | EntityArchetype::ShareholderLegalEntity
        )
    }
}

/// One attribute-to-category binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub field: &'static str,
    pub category: &'static str,
}

const fn map(field: &'static str, category: &'static str) -> FieldMapping {
    FieldMapping { field, category }
}

const NATURAL_PERSON: &[FieldMapping] = &[
    map(fields::FULL_NAME_SANCTION_MATCH, categories::FULL_NAME_SANCTION),
    map(fields::PEP, categories::PEP),
    map(fields::RESIDENCY_STATUS, categories::RESIDENCY_STATUS),
    map(fields::NATIONALITY, categories::NATIONALITY),
    map(fields::IS_DUAL_NATIONALITY, categories::IS_DUAL_NATIONALITY),
    map(fields::DUAL_NATIONALITY, categories::DUAL_NATIONALITY_COUNTRIES),
    map(fields::COUNTRY_OF_BIRTH, categories::COUNTRY_OF_BIRTH),
    map(fields::COUNTRY_OF_RESIDENCE, categories::COUNTRY_OF_RESIDENCE),
    map(fields::OCCUPATION, categories::OCCUPATION),
    map(fields::EMPLOYMENT_STATUS, categories::EMPLOYMENT_STATUS),
    map(fields::SOURCE_OF_FUNDS, categories::SOURCE_OF_FUNDS),
    map(fields::SOURCE_OF_FUNDS_COUNTRIES, categories::SOURCE_OF_FUNDS_COUNTRIES),
    map(fields::PRODUCT_TYPE, categories::PRODUCT_TYPE),
    map(fields::DELIVERY_CHANNEL, categories::DELIVERY_CHANNEL),
];

const LEGAL_ENTITY: &[FieldMapping] = &[
    map(fields::FULL_NAME_SANCTION_MATCH, categories::FULL_NAME_SANCTION),
    map(fields::BUSINESS_ACTIVITY, categories::BUSINESS_ACTIVITY),
    map(fields::LEGAL_FORM, categories::LEGAL_FORM),
    map(fields::NATIONALITY, categories::NATIONALITY),
    map(fields::COUNTRY_OF_INCORPORATION, categories::COUNTRY_OF_INCORPORATION),
    map(fields::OPERATION_COUNTRIES, categories::OPERATION_COUNTRIES),
    map(fields::SOURCE_OF_FUNDS, categories::SOURCE_OF_FUNDS),
    map(fields::SOURCE_OF_FUNDS_COUNTRIES, categories::SOURCE_OF_FUNDS_COUNTRIES),
    map(fields::PRODUCT_TYPE, categories::PRODUCT_TYPE),
    map(fields::DELIVERY_CHANNEL, categories::DELIVERY_CHANNEL),
];

const SHAREHOLDER_NATURAL_PERSON: &[FieldMapping] = &[
    map(fields::FULL_NAME_SANCTION_MATCH, categories::FULL_NAME_SANCTION),
    map(fields::PEP, categories::PEP),
    map(fields::NATIONALITY, categories::NATIONALITY),
    map(fields::IS_DUAL_NATIONALITY, categories::IS_DUAL_NATIONALITY),
    map(fields::DUAL_NATIONALITY, categories::DUAL_NATIONALITY_COUNTRIES),
    map(fields::COUNTRY_OF_RESIDENCE, categories::COUNTRY_OF_RESIDENCE),
    map(fields::OCCUPATION, categories::OCCUPATION),
];

const SHAREHOLDER_LEGAL_ENTITY: &[FieldMapping] = &[
    map(fields::FULL_NAME_SANCTION_MATCH, categories::FULL_NAME_SANCTION),
    map(fields::NATIONALITY, categories::NATIONALITY),
    map(fields::COUNTRY_OF_INCORPORATION, categories::COUNTRY_OF_INCORPORATION),
    map(fields::BUSINESS_ACTIVITY, categories::BUSINESS_ACTIVITY),
    map(fields::LEGAL_FORM, categories::LEGAL_FORM),
];

/// Ordered field mapping for an archetype. Order drives audit-trail order.
pub fn mapping_for(archetype: EntityArchetype) -> &'static [FieldMapping] {
    match archetype {
        EntityArchetype::NaturalPerson => NATURAL_PERSON,
        EntityArchetype::LegalEntity => LEGAL_ENTITY,
        EntityArchetype::ShareholderNaturalPerson => SHAREHOLDER_NATURAL_PERSON,
        EntityArchetype::ShareholderLegalEntity => SHAREHOLDER_LEGAL_ENTITY,
    }
}

/// Every attribute name any mapping reads, in first-seen order.
pub fn all_attribute_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for table in [
        NATURAL_PERSON,
        LEGAL_ENTITY,
        SHAREHOLDER_NATURAL_PERSON,
        SHAREHOLDER_LEGAL_ENTITY,
    ] {
        for m in table {
            if !names.contains(&m.field) {
                names.push(m.field);
            }
        }
    }
    names
}

/// Categories whose rules an evaluation of `archetype` can fire.
pub fn relevant_categories(
    archetype: EntityArchetype,
    include_shareholders: bool,
) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = vec![categories::FULL_NAME_SANCTION];
    let mut push_all = |table: &[FieldMapping]| {
        for m in table {
            if !out.contains(&m.category) {
                out.push(m.category);
            }
        }
    };
    push_all(mapping_for(archetype));
    if include_shareholders {
        push_all(SHAREHOLDER_NATURAL_PERSON);
        push_all(SHAREHOLDER_LEGAL_ENTITY);
        if !out.contains(&categories::CUSTOMER_TYPE) {
            out.push(categories::CUSTOMER_TYPE);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

pub fn should_always_evaluate(field_name: &str) -> bool {
    field_name == fields::IS_DUAL_NATIONALITY || field_name == fields::FULL_NAME_SANCTION_MATCH
}

/// Value used for an always-evaluated field when the record leaves it empty.
pub fn default_value(field_name: &str) -> Option<&'static str> {
    match field_name {
        fields::IS_DUAL_NATIONALITY => Some("No"),
        _ => None,
    }
}

/// True when the field sits behind a gate that is currently closed.
/// Only `dualNationality` is gated, on `isDualNationality == "Yes"`.
pub fn is_gated(field_name: &str, attributes: &Attributes) -> bool {
    if field_name != fields::DUAL_NATIONALITY {
        return false;
    }
    let gate = attributes
        .text(fields::IS_DUAL_NATIONALITY)
        .and_then(normalize_text);
    gate.as_deref() != Some("yes")
}

pub fn is_multi_valued(field_name: &str) -> bool {
    MULTI_VALUED_FIELDS.contains(&field_name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_type_parsing() {
        assert_eq!(
            EntityArchetype::from_customer_type("Natural Person"),
            Some(EntityArchetype::NaturalPerson)
        );
        assert_eq!(
            EntityArchetype::from_customer_type("  legal   ENTITIES "),
            Some(EntityArchetype::LegalEntity)
        );
        assert_eq!(EntityArchetype::from_customer_type("Trust"), None);
        assert_eq!(EntityArchetype::from_customer_type(""), None);
    }

    #[test]
    fn test_shareholder_defaults_to_legal_entity() {
        assert_eq!(
            EntityArchetype::for_shareholder(Some("Natural Person")),
            EntityArchetype::ShareholderNaturalPerson
        );
        assert_eq!(
            EntityArchetype::for_shareholder(Some("Offshore Company")),
            EntityArchetype::ShareholderLegalEntity
        );
        assert_eq!(
            EntityArchetype::for_shareholder(None),
            EntityArchetype::ShareholderLegalEntity
        );
    }

    #[test]
    fn test_sanction_mapping_leads_every_archetype() {
        for archetype in [
            EntityArchetype::NaturalPerson,
            EntityArchetype::LegalEntity,
            EntityArchetype::ShareholderNaturalPerson,
            EntityArchetype::ShareholderLegalEntity,
        ] {
            assert_eq!(mapping_for(archetype)[0].field, fields::FULL_NAME_SANCTION_MATCH);
        }
    }

    #[test]
    fn test_always_evaluate() {
        assert!(should_always_evaluate("isDualNationality"));
        assert!(should_always_evaluate("fullNameSanctionMatch"));
        assert!(!should_always_evaluate("nationality"));
        assert_eq!(default_value("isDualNationality"), Some("No"));
    }

    #[test]
    fn test_dual_nationality_gate() {
        let closed = Attributes::default().with(fields::IS_DUAL_NATIONALITY, "No");
        let open = Attributes::default().with(fields::IS_DUAL_NATIONALITY, " yes ");
        assert!(is_gated(fields::DUAL_NATIONALITY, &closed));
        assert!(is_gated(fields::DUAL_NATIONALITY, &Attributes::default()));
        assert!(!is_gated(fields::DUAL_NATIONALITY, &open));
        assert!(!is_gated(fields::NATIONALITY, &closed));
    }

    #[test]
    fn test_relevant_categories_with_shareholders() {
        let without = relevant_categories(EntityArchetype::LegalEntity, false);
        assert!(!without.contains(&categories::CUSTOMER_TYPE));
        assert!(!without.contains(&categories::PEP));

        let with = relevant_categories(EntityArchetype::LegalEntity, true);
        assert!(with.contains(&categories::CUSTOMER_TYPE));
        assert!(with.contains(&categories::PEP));
        assert_eq!(with[0], categories::FULL_NAME_SANCTION);
    }

    #[test]
    fn test_attribute_names_are_unique() {
        let names = all_attribute_names();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names.len(), sorted.len());
        assert!(names.contains(&fields::OPERATION_COUNTRIES));
    }
}
