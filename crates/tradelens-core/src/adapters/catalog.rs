//! Harmonized System and country reference tables.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::data_source::{CodeMatch, SearchMode, SearchRequest};
use crate::{CoreError, Country, HsCode};

const BUNDLED_CATALOG: &str = include_str!("../../data/catalog.json");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: Vec<ProductEntry>,
    countries: Vec<CountryEntry>,
}

#[derive(Debug, Deserialize)]
struct ProductEntry {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    name: String,
    code: String,
    iso2: String,
}

/// In-memory classification snapshot.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: BTreeMap<HsCode, String>,
    countries: Vec<Country>,
}

impl Catalog {
    /// The snapshot shipped with the crate.
    pub fn bundled() -> Result<Self, CoreError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let file: CatalogFile = serde_json::from_str(text)?;

        let mut products = BTreeMap::new();
        for entry in file.products {
            products.insert(HsCode::parse(&entry.code)?, entry.description);
        }
        let countries = file
            .countries
            .into_iter()
            .map(|entry| Country::new(entry.name, entry.code, entry.iso2))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            products = products.len(),
            countries = countries.len(),
            "catalog loaded"
        );
        Ok(Self {
            products,
            countries,
        })
    }

    pub fn product(&self, code: &HsCode) -> Option<&str> {
        self.products.get(code).map(String::as_str)
    }

    /// Codes exactly one level below `code`.
    pub fn children(&self, code: &HsCode) -> BTreeMap<HsCode, String> {
        self.products
            .range(code.clone()..)
            .take_while(|(candidate, _)| candidate.starts_with(code))
            .filter(|(candidate, _)| candidate.parent().as_ref() == Some(code))
            .map(|(candidate, description)| (candidate.clone(), description.clone()))
            .collect()
    }

    pub fn country_by_name(&self, name: &str) -> Option<&Country> {
        let name = name.trim();
        self.countries
            .iter()
            .find(|country| country.name.eq_ignore_ascii_case(name))
    }

    pub fn country_by_code(&self, code: &str) -> Option<&Country> {
        let code = code.trim();
        self.countries.iter().find(|country| country.code == code)
    }

    pub fn country_by_iso2(&self, iso2: &str) -> Option<&Country> {
        let iso2 = iso2.trim();
        self.countries
            .iter()
            .find(|country| country.iso2.eq_ignore_ascii_case(iso2))
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    /// Codes whose description contains the request's keywords, in code order.
    pub fn search(&self, request: &SearchRequest) -> Vec<CodeMatch> {
        self.products
            .iter()
            .filter(|(code, _)| {
                request.in_codes.is_empty()
                    || request.in_codes.iter().any(|prefix| code.starts_with(prefix))
            })
            .filter(|(_, description)| {
                let description = description.to_ascii_lowercase();
                let mut hits = request
                    .keywords
                    .iter()
                    .map(|keyword| description.contains(keyword.as_str()));
                match request.mode {
                    SearchMode::Any => hits.any(|hit| hit),
                    SearchMode::All => hits.all(|hit| hit),
                }
            })
            .map(|(code, description)| CodeMatch {
                code: code.clone(),
                description: description.clone(),
            })
            .collect()
    }
}
