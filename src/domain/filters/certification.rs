use crate::entities::technology::TagPivot;

use super::{FilterField, FilterKind, FilterSet, SortDirection, SortKey};

pub static CERTIFICATION_FILTERS: FilterSet = FilterSet {
    table: "certifications",
    fields: &[
        FilterField { name: "id", kind: FilterKind::EqualsId("id") },
        FilterField { name: "name", kind: FilterKind::Contains("name") },
        FilterField { name: "issuing_organization", kind: FilterKind::Contains("issuing_organization") },
        FilterField { name: "credential_id", kind: FilterKind::Contains("credential_id") },
        FilterField { name: "credential_url", kind: FilterKind::Contains("credential_url") },
        FilterField { name: "issue_date_start", kind: FilterKind::OnOrAfter("issue_date") },
        FilterField { name: "issue_date_end", kind: FilterKind::OnOrBefore("issue_date") },
        FilterField { name: "expiration_date_start", kind: FilterKind::OnOrAfter("expiration_date") },
        FilterField { name: "expiration_date_end", kind: FilterKind::OnOrBefore("expiration_date") },
        FilterField { name: "technologies", kind: FilterKind::HasTechnology(TagPivot::Certification) },
    ],
    sorts: &[
        SortKey::Column("id"),
        SortKey::Column("name"),
        SortKey::Column("issuing_organization"),
        SortKey::Column("issue_date"),
        SortKey::Column("expiration_date"),
        SortKey::Column("credential_id"),
        SortKey::Column("credential_url"),
        SortKey::FirstTechnology { name: "technology", pivot: TagPivot::Certification },
        SortKey::Column("created_at"),
        SortKey::Column("updated_at"),
    ],
    default_sort: SortKey::Column("id"),
    default_direction: SortDirection::Asc,
};
