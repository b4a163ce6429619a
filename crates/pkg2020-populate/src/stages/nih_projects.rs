//! NIH projects and their principal investigators (OA07).

use pkg2020_core::entity_key;
use pkg2020_ontology::{Author, DataProperty, NihProject, ObjectProperty, Session};
use serde::Deserialize;

use super::{Resolver, StageInput, StageOutput, loaded_author, set_data, set_object};
use crate::source::{self, SourceError, Skip, identifier, present};

#[derive(Debug, Deserialize)]
struct ProjectRow {
    #[serde(rename = "id", default, deserialize_with = "present")]
    id: Option<String>,
    #[serde(rename = "AND_ID", default, deserialize_with = "present")]
    and_id: Option<String>,
    #[serde(rename = "ProjectNumber", default, deserialize_with = "present")]
    project_number: Option<String>,
    #[serde(rename = "PI_Name", default, deserialize_with = "present")]
    pi_name: Option<String>,
}

/// Projects are keyed by project number, or by row id when the number is
/// absent, so several investigators on one grant share one project.
pub fn populate(session: &mut Session<'_>, input: &StageInput<'_>) -> Result<StageOutput, SourceError> {
    let mut projects = Resolver::<NihProject>::seeded(session);

    let tally = source::read_rows(
        input.dataset,
        input.path,
        input.limit,
        input.bar,
        |_, row: ProjectRow| {
            let author = loaded_author(session, row.and_id.as_deref())?;
            let number = match (row.project_number, row.id.as_deref()) {
                (Some(number), _) => number,
                (None, Some(id)) => identifier(id),
                (None, None) => return Err(Skip::MissingKey("ProjectNumber")),
            };

            let project = entity_key("NIHProject", &number);
            projects.resolve(session, &project);
            set_data::<NihProject>(session, &project, DataProperty::ProjectNumber, number);
            if let Some(pi) = row.pi_name {
                set_data::<NihProject>(session, &project, DataProperty::PiName, pi);
            }

            set_object::<Author>(session, &author, ObjectProperty::HasProject, &project);
            set_object::<NihProject>(
                session,
                &project,
                ObjectProperty::IsPrincipalInvestigator,
                &author,
            );
            Ok(())
        },
    )?;

    Ok(StageOutput {
        tally,
        reused: projects.reused(),
    })
}
