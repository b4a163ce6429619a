//! Author affiliations and the organizations they point to (OA04).

use pkg2020_core::entity_key;
use pkg2020_ontology::{Affiliation, Author, DataProperty, ObjectProperty, Organization, Session};
use serde::Deserialize;

use super::{Resolver, StageInput, StageOutput, loaded_author, set_data, set_object};
use crate::source::{self, SourceError, Skip, identifier, present};

#[derive(Debug, Deserialize)]
struct AffiliationRow {
    #[serde(rename = "id", default, deserialize_with = "present")]
    id: Option<String>,
    #[serde(rename = "AND_ID", default, deserialize_with = "present")]
    and_id: Option<String>,
    #[serde(rename = "Affiliation", default, deserialize_with = "present")]
    organization: Option<String>,
    #[serde(rename = "City", default, deserialize_with = "present")]
    city: Option<String>,
    #[serde(rename = "State", default, deserialize_with = "present")]
    state: Option<String>,
    #[serde(rename = "Country", default, deserialize_with = "present")]
    country: Option<String>,
}

pub fn populate(session: &mut Session<'_>, input: &StageInput<'_>) -> Result<StageOutput, SourceError> {
    let mut affiliations = Resolver::<Affiliation>::seeded(session);
    let mut organizations = Resolver::<Organization>::seeded(session);

    let tally = source::read_rows(
        input.dataset,
        input.path,
        input.limit,
        input.bar,
        |_, row: AffiliationRow| {
            let author = loaded_author(session, row.and_id.as_deref())?;
            let id = identifier(row.id.as_deref().ok_or(Skip::MissingKey("id"))?);

            let affiliation = entity_key("Affiliation", &id);
            affiliations.resolve(session, &affiliation);
            for (property, value) in [
                (DataProperty::City, row.city),
                (DataProperty::State, row.state),
                (DataProperty::Country, row.country),
            ] {
                if let Some(value) = value {
                    set_data::<Affiliation>(session, &affiliation, property, value);
                }
            }

            if let Some(name) = row.organization.as_deref() {
                let organization = entity_key("Organization", name);
                organizations.resolve(session, &organization);
                set_object::<Affiliation>(
                    session,
                    &affiliation,
                    ObjectProperty::AffiliatedWith,
                    &organization,
                );
            }

            set_object::<Author>(session, &author, ObjectProperty::HasAffiliation, &affiliation);
            Ok(())
        },
    )?;

    Ok(StageOutput {
        tally,
        reused: affiliations.reused() + organizations.reused(),
    })
}
