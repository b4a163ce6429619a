//! Education records (OA06).

use pkg2020_core::{entity_key, sanitize};
use pkg2020_ontology::{Author, DataProperty, Education, Institution, ObjectProperty, Session};
use serde::Deserialize;

use super::{Resolver, StageInput, StageOutput, loaded_author, set_data, set_object, set_year};
use crate::source::{self, SourceError, identifier, present};

#[derive(Debug, Deserialize)]
struct EducationRow {
    #[serde(rename = "id", default, deserialize_with = "present")]
    id: Option<String>,
    #[serde(rename = "AND_ID", default, deserialize_with = "present")]
    and_id: Option<String>,
    #[serde(rename = "Institution", default, deserialize_with = "present")]
    institution: Option<String>,
    #[serde(rename = "Degree", default, deserialize_with = "present")]
    degree: Option<String>,
    #[serde(rename = "StartYear", default, deserialize_with = "present")]
    start_year: Option<String>,
    #[serde(rename = "EndYear", default, deserialize_with = "present")]
    end_year: Option<String>,
}

/// One `Education_<id>` per row (the row index stands in for a missing id),
/// at an institution keyed by sanitized name. Degrees are stored sanitized.
pub fn populate(session: &mut Session<'_>, input: &StageInput<'_>) -> Result<StageOutput, SourceError> {
    let mut educations = Resolver::<Education>::seeded(session);
    let mut institutions = Resolver::<Institution>::seeded(session);

    let tally = source::read_rows(
        input.dataset,
        input.path,
        input.limit,
        input.bar,
        |index, row: EducationRow| {
            let author = loaded_author(session, row.and_id.as_deref())?;
            let id = match row.id.as_deref() {
                Some(id) => identifier(id),
                None => format!("row{index}"),
            };

            let education = entity_key("Education", &id);
            educations.resolve(session, &education);
            if let Some(degree) = row.degree.as_deref() {
                set_data::<Education>(session, &education, DataProperty::Degree, sanitize(degree));
            }
            set_year::<Education>(
                session,
                &education,
                DataProperty::StartYear,
                row.start_year.as_deref(),
            );
            set_year::<Education>(
                session,
                &education,
                DataProperty::EndYear,
                row.end_year.as_deref(),
            );

            if let Some(name) = row.institution.as_deref() {
                let institution = entity_key("Institution", name);
                institutions.resolve(session, &institution);
                set_object::<Education>(
                    session,
                    &education,
                    ObjectProperty::EducatedAt,
                    &institution,
                );
            }

            set_object::<Author>(session, &author, ObjectProperty::HasEducation, &education);
            Ok(())
        },
    )?;

    Ok(StageOutput {
        tally,
        reused: educations.reused() + institutions.reused(),
    })
}
