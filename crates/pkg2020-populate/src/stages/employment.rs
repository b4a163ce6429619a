//! Employment records (OA05).

use pkg2020_core::entity_key;
use pkg2020_ontology::{Author, DataProperty, Employment, ObjectProperty, Organization, Session};
use serde::Deserialize;

use super::{Resolver, StageInput, StageOutput, loaded_author, set_data, set_object, set_year};
use crate::source::{self, SourceError, Skip, identifier, present};

#[derive(Debug, Deserialize)]
struct EmploymentRow {
    #[serde(rename = "id", default, deserialize_with = "present")]
    id: Option<String>,
    #[serde(rename = "AND_ID", default, deserialize_with = "present")]
    and_id: Option<String>,
    #[serde(rename = "Organization", default, deserialize_with = "present")]
    organization: Option<String>,
    #[serde(rename = "Role", alias = "JobTitle", default, deserialize_with = "present")]
    job_title: Option<String>,
    #[serde(rename = "StartYear", default, deserialize_with = "present")]
    start_year: Option<String>,
    #[serde(rename = "EndYear", default, deserialize_with = "present")]
    end_year: Option<String>,
    #[serde(rename = "ORCID", default, deserialize_with = "present")]
    orcid: Option<String>,
}

/// One `Employment_<id>` per row, employed at an organization shared with the
/// affiliation stage by sanitized name. The row's ORCID lands on the author.
pub fn populate(session: &mut Session<'_>, input: &StageInput<'_>) -> Result<StageOutput, SourceError> {
    let mut employments = Resolver::<Employment>::seeded(session);
    let mut organizations = Resolver::<Organization>::seeded(session);

    let tally = source::read_rows(
        input.dataset,
        input.path,
        input.limit,
        input.bar,
        |_, row: EmploymentRow| {
            let author = loaded_author(session, row.and_id.as_deref())?;
            let id = identifier(row.id.as_deref().ok_or(Skip::MissingKey("id"))?);

            let employment = entity_key("Employment", &id);
            employments.resolve(session, &employment);
            if let Some(title) = row.job_title {
                set_data::<Employment>(session, &employment, DataProperty::JobTitle, title);
            }
            set_year::<Employment>(
                session,
                &employment,
                DataProperty::StartYear,
                row.start_year.as_deref(),
            );
            set_year::<Employment>(
                session,
                &employment,
                DataProperty::EndYear,
                row.end_year.as_deref(),
            );

            if let Some(name) = row.organization.as_deref() {
                let organization = entity_key("Organization", name);
                organizations.resolve(session, &organization);
                set_object::<Employment>(
                    session,
                    &employment,
                    ObjectProperty::EmployedAt,
                    &organization,
                );
            }

            set_object::<Author>(session, &author, ObjectProperty::HasEmployment, &employment);
            if let Some(orcid) = row.orcid {
                set_data::<Author>(session, &author, DataProperty::Orcid, orcid);
            }
            Ok(())
        },
    )?;

    Ok(StageOutput {
        tally,
        reused: employments.reused() + organizations.reused(),
    })
}
