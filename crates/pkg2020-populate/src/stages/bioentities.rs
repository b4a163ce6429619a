//! Bio-entities mentioned by articles (OA02 main, OA03 mutations).

use pkg2020_core::entity_key;
use pkg2020_ontology::{Article, BioEntity, BioKind, DataProperty, ObjectProperty, Session};
use serde::Deserialize;

use super::{Resolver, StageInput, StageOutput, loaded_article, set_data, set_object};
use crate::source::{self, SourceError, Skip, identifier, present};

#[derive(Debug, Deserialize)]
struct BioEntityRow {
    #[serde(rename = "PMID", default, deserialize_with = "present")]
    pmid: Option<String>,
    #[serde(rename = "id", default, deserialize_with = "present")]
    id: Option<String>,
    #[serde(rename = "Type", default, deserialize_with = "present")]
    kind: Option<String>,
    #[serde(rename = "Name", default, deserialize_with = "present")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MutationRow {
    #[serde(rename = "PMID", default, deserialize_with = "present")]
    pmid: Option<String>,
    #[serde(rename = "id", default, deserialize_with = "present")]
    id: Option<String>,
    #[serde(rename = "MutationType", default, deserialize_with = "present")]
    mutation_type: Option<String>,
}

/// Fields shared by both bio-entity files once a row is decoded.
struct Mention<'r> {
    key: String,
    kind: BioKind,
    entity_id: &'r str,
    entity_type: Option<&'r str>,
    entity_name: Option<&'r str>,
}

fn record(
    session: &mut Session<'_>,
    entities: &mut Resolver<BioEntity>,
    article: &str,
    mention: Mention<'_>,
) {
    let entity = entities.resolve(session, &mention.key);
    // The first row naming a specific type sets the subtype; later ones never change it.
    if entity.kind == BioKind::Generic {
        entity.kind = mention.kind;
    }
    set_data::<BioEntity>(session, &mention.key, DataProperty::EntityId, mention.entity_id);
    if let Some(kind) = mention.entity_type {
        set_data::<BioEntity>(session, &mention.key, DataProperty::EntityType, kind);
    }
    if let Some(name) = mention.entity_name {
        set_data::<BioEntity>(session, &mention.key, DataProperty::EntityName, name);
    }
    set_object::<Article>(session, article, ObjectProperty::MentionsBioEntity, &mention.key);
}

/// `BioEntity_<id>` rows, typed by their `Type` column. Rows whose article is
/// not loaded are skipped.
pub fn populate_main(
    session: &mut Session<'_>,
    input: &StageInput<'_>,
) -> Result<StageOutput, SourceError> {
    let mut entities = Resolver::<BioEntity>::seeded(session);

    let tally = source::read_rows(
        input.dataset,
        input.path,
        input.limit,
        input.bar,
        |_, row: BioEntityRow| {
            let article = loaded_article(session, row.pmid.as_deref())?;
            let id = identifier(row.id.as_deref().ok_or(Skip::MissingKey("id"))?);
            let kind = row
                .kind
                .as_deref()
                .map_or(BioKind::Generic, BioKind::from_type_label);
            let mention = Mention {
                key: entity_key("BioEntity", &id),
                kind,
                entity_id: &id,
                entity_type: row.kind.as_deref(),
                entity_name: row.name.as_deref(),
            };
            record(session, &mut entities, &article, mention);
            Ok(())
        },
    )?;

    Ok(StageOutput {
        tally,
        reused: entities.reused(),
    })
}

/// `Mutation_<id>` rows, named by their mutation type.
pub fn populate_mutations(
    session: &mut Session<'_>,
    input: &StageInput<'_>,
) -> Result<StageOutput, SourceError> {
    let mut entities = Resolver::<BioEntity>::seeded(session);

    let tally = source::read_rows(
        input.dataset,
        input.path,
        input.limit,
        input.bar,
        |_, row: MutationRow| {
            let article = loaded_article(session, row.pmid.as_deref())?;
            let id = identifier(row.id.as_deref().ok_or(Skip::MissingKey("id"))?);
            let mention = Mention {
                key: entity_key("Mutation", &id),
                kind: BioKind::Mutation,
                entity_id: &id,
                entity_type: Some("Mutation"),
                entity_name: row.mutation_type.as_deref(),
            };
            record(session, &mut entities, &article, mention);
            Ok(())
        },
    )?;

    Ok(StageOutput {
        tally,
        reused: entities.reused(),
    })
}
