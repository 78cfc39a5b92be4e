use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Price = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Small,
    Sedan,
    Suv,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 3] = [Self::Small, Self::Sedan, Self::Suv];

    /// Label users pick from the vehicle menu.
    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "小型車",
            Self::Sedan => "中型車",
            Self::Suv => "大型車/SUV",
        }
    }

    pub fn example_models(self) -> &'static str {
        match self {
            Self::Small => "例如：Yaris、Fit",
            Self::Sedan => "例如：Corolla、Civic",
            Self::Suv => "例如：RAV4、CR-V",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.label() == label)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(BTreeMap<VehicleClass, Price>);

impl PriceTable {
    pub fn new(small: Price, sedan: Price, suv: Price) -> Self {
        Self(BTreeMap::from([
            (VehicleClass::Small, small),
            (VehicleClass::Sedan, sedan),
            (VehicleClass::Suv, suv),
        ]))
    }

    pub fn get(&self, class: VehicleClass) -> Option<Price> {
        self.0.get(&class).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VehicleClass, Price)> + '_ {
        self.0.iter().map(|(class, price)| (*class, *price))
    }

    fn missing_class(&self) -> Option<VehicleClass> {
        VehicleClass::ALL.into_iter().find(|class| !self.0.contains_key(class))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubService {
    pub name: String,
    pub difference: String,
    pub prices: PriceTable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_services: Vec<SubService>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_prices: Option<PriceTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<String>,
}

impl Category {
    pub fn has_sub_services(&self) -> bool {
        !self.sub_services.is_empty()
    }

    pub fn sub_service(&self, name: &str) -> Option<&SubService> {
        self.sub_services.iter().find(|sub| sub.name == name)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("catalog must contain at least one category")]
    Empty,
    #[error("duplicate category `{0}`")]
    DuplicateCategory(String),
    #[error("duplicate sub-service `{sub_service}` in category `{category}`")]
    DuplicateSubService { category: String, sub_service: String },
    #[error("category `{0}` has neither sub-services nor direct prices")]
    MissingPricing(String),
    #[error("category `{0}` has both sub-services and direct prices")]
    AmbiguousPricing(String),
    #[error("price table for `{owner}` has no entry for {class:?}")]
    IncompletePriceTable { owner: String, class: VehicleClass },
    #[error("price table for `{owner}` has a zero price for {class:?}")]
    NonPositivePrice { owner: String, class: VehicleClass },
}

/// Ordered category list backing both the menus and the price lookups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    #[serde(rename = "category")]
    categories: Vec<Category>,
}

impl ServiceCatalog {
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        let catalog = Self { categories };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn standard() -> Self {
        Self { categories: standard_categories() }
    }

    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, CatalogError> {
        let catalog = toml::from_str::<ServiceCatalog>(raw)
            .map_err(|source| CatalogError::ParseFile { path: path.to_path_buf(), source })?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw, path)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|category| category.name.as_str())
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.categories.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = BTreeSet::new();
        for category in &self.categories {
            if !seen.insert(category.name.as_str()) {
                return Err(CatalogError::DuplicateCategory(category.name.clone()));
            }

            match (category.has_sub_services(), &category.direct_prices) {
                (false, None) => return Err(CatalogError::MissingPricing(category.name.clone())),
                (true, Some(_)) => {
                    return Err(CatalogError::AmbiguousPricing(category.name.clone()))
                }
                (false, Some(prices)) => validate_table(&category.name, prices)?,
                (true, None) => {
                    let mut sub_names = BTreeSet::new();
                    for sub in &category.sub_services {
                        if !sub_names.insert(sub.name.as_str()) {
                            return Err(CatalogError::DuplicateSubService {
                                category: category.name.clone(),
                                sub_service: sub.name.clone(),
                            });
                        }
                        validate_table(&format!("{}/{}", category.name, sub.name), &sub.prices)?;
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn validate_table(owner: &str, prices: &PriceTable) -> Result<(), CatalogError> {
    if let Some(class) = prices.missing_class() {
        return Err(CatalogError::IncompletePriceTable { owner: owner.to_string(), class });
    }
    if let Some((class, _)) = prices.iter().find(|(_, price)| *price == 0) {
        return Err(CatalogError::NonPositivePrice { owner: owner.to_string(), class });
    }
    Ok(())
}

fn sub(name: &str, difference: &str, prices: PriceTable) -> SubService {
    SubService { name: name.to_string(), difference: difference.to_string(), prices }
}

fn standard_categories() -> Vec<Category> {
    vec![
        Category {
            name: "清潔養護".to_string(),
            sub_services: vec![
                sub("基礎洗車", "基礎洗車：僅清洗車身外部。", PriceTable::new(500, 700, 900)),
                sub(
                    "高級洗車",
                    "高級洗車：包含車內吸塵和車身打蠟。",
                    PriceTable::new(800, 1000, 1300),
                ),
            ],
            direct_prices: None,
            difference: Some(
                "基礎洗車：僅清洗車身外部。\n高級洗車：包含車內吸塵和車身打蠟。".to_string(),
            ),
        },
        Category {
            name: "拋光美容".to_string(),
            sub_services: vec![
                sub("打蠟", "打蠟：手工塗抹蠟增進車漆光澤。", PriceTable::new(1500, 1800, 2200)),
                sub("拋光", "拋光：機器拋光去除細微刮痕。", PriceTable::new(2000, 2500, 3000)),
            ],
            direct_prices: None,
            difference: Some(
                "打蠟：手工塗抹蠟增進車漆光澤。\n拋光：使用拋光機處理，減少車漆瑕疵。".to_string(),
            ),
        },
        Category {
            name: "鍍膜套餐".to_string(),
            sub_services: vec![
                sub("單層鍍膜", "單層鍍膜：一層鍍膜施工。", PriceTable::new(5000, 6000, 7000)),
                sub(
                    "雙層鍍膜",
                    "雙層鍍膜：兩層鍍膜，更持久亮度。",
                    PriceTable::new(8000, 9000, 10000),
                ),
            ],
            direct_prices: None,
            difference: Some(
                "單層鍍膜：基礎鍍膜一次。\n雙層鍍膜：重複鍍膜兩次，提升持久度和光澤。".to_string(),
            ),
        },
        Category {
            name: "全車玻璃鍍膜+除油膜".to_string(),
            sub_services: Vec::new(),
            direct_prices: Some(PriceTable::new(3000, 3000, 3500)),
            difference: None,
        },
    ]
}
