//! Population datasets and their source files

use std::fmt;
use std::str::FromStr;

/// One population stage, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dataset {
    AuthorsArticles,
    Affiliations,
    Employment,
    Education,
    BioEntities,
    BioMutations,
    NihProjects,
    HandAnnotated,
    Links,
}

impl Dataset {
    /// Every dataset in the order the pipeline runs them.
    pub const ALL: [Dataset; 9] = [
        Dataset::AuthorsArticles,
        Dataset::Affiliations,
        Dataset::Employment,
        Dataset::Education,
        Dataset::BioEntities,
        Dataset::BioMutations,
        Dataset::NihProjects,
        Dataset::HandAnnotated,
        Dataset::Links,
    ];

    /// The CSV-backed stages that make up a default population run.
    pub const SOURCED: [Dataset; 7] = [
        Dataset::AuthorsArticles,
        Dataset::Affiliations,
        Dataset::Employment,
        Dataset::Education,
        Dataset::BioEntities,
        Dataset::BioMutations,
        Dataset::NihProjects,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthorsArticles => "authors",
            Self::Affiliations => "affiliations",
            Self::Employment => "employment",
            Self::Education => "education",
            Self::BioEntities => "bio-entities",
            Self::BioMutations => "bio-mutations",
            Self::NihProjects => "nih-projects",
            Self::HandAnnotated => "hand-annotated",
            Self::Links => "links",
        }
    }

    /// Default source file name, `None` for stages without a CSV source.
    pub fn default_file(self) -> Option<&'static str> {
        match self {
            Self::AuthorsArticles => Some("OA01_Author_List.csv"),
            Self::BioEntities => Some("OA02_Bio_entities_Main.csv"),
            Self::BioMutations => Some("OA03_Bio_entities_Mutation.csv"),
            Self::Affiliations => Some("OA04_Affiliations.csv"),
            Self::Employment => Some("OA05_Researcher_Employment.csv"),
            Self::Education => Some("OA06_Researcher_Education.csv"),
            Self::NihProjects => Some("OA07_NIH_Projects.csv"),
            Self::HandAnnotated | Self::Links => None,
        }
    }

    /// Bio-entity files live in their own directory.
    pub fn is_bio(self) -> bool {
        matches!(self, Self::BioEntities | Self::BioMutations)
    }

    pub fn has_source(self) -> bool {
        self.default_file().is_some()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "authors" | "articles" | "authors-articles" => Ok(Self::AuthorsArticles),
            "affiliations" => Ok(Self::Affiliations),
            "employment" => Ok(Self::Employment),
            "education" => Ok(Self::Education),
            "bio-entities" | "bioentities" => Ok(Self::BioEntities),
            "bio-mutations" | "mutations" => Ok(Self::BioMutations),
            "nih-projects" | "nih" => Ok(Self::NihProjects),
            "hand-annotated" | "hand" => Ok(Self::HandAnnotated),
            "links" => Ok(Self::Links),
            _ => Err(format!(
                "unknown dataset '{s}' (expected one of: {})",
                Self::ALL.map(Self::as_str).join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for d in Dataset::ALL {
            assert_eq!(d.as_str().parse::<Dataset>(), Ok(d));
        }
    }

    #[test]
    fn aliases() {
        assert_eq!("nih".parse::<Dataset>(), Ok(Dataset::NihProjects));
        assert_eq!("bio_entities".parse::<Dataset>(), Ok(Dataset::BioEntities));
        assert!("patents".parse::<Dataset>().is_err());
    }

    #[test]
    fn sourced_stages_have_files() {
        for d in Dataset::SOURCED {
            assert!(d.has_source(), "{d}");
        }
        assert!(!Dataset::HandAnnotated.has_source());
        assert!(!Dataset::Links.has_source());
    }
}
