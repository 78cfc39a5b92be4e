use std::path::PathBuf;

use detailbook_core::catalog::{PriceTable, ServiceCatalog, VehicleClass};

use crate::commands::{load_catalog, CommandResult};

pub fn run(catalog_path: Option<PathBuf>, json_output: bool) -> CommandResult {
    let catalog = match load_catalog(catalog_path) {
        Ok((_, catalog)) => catalog,
        Err(failure) => return failure.into_result("catalog"),
    };

    if json_output {
        return match serde_json::to_string_pretty(&catalog) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("catalog", "serialization", error.to_string(), 1),
        };
    }

    CommandResult { exit_code: 0, output: render_matrix(&catalog) }
}

fn render_matrix(catalog: &ServiceCatalog) -> String {
    let header = VehicleClass::ALL.map(VehicleClass::label).join(" | ");
    let mut lines = vec![format!("service | {header}")];

    for category in catalog.categories() {
        if let Some(prices) = &category.direct_prices {
            lines.push(render_row(&category.name, prices));
        }
        for sub in &category.sub_services {
            lines.push(render_row(&format!("{} / {}", category.name, sub.name), &sub.prices));
        }
    }

    lines.join("\n")
}

fn render_row(name: &str, prices: &PriceTable) -> String {
    let cells: Vec<String> = VehicleClass::ALL
        .into_iter()
        .map(|class| prices.get(class).map_or_else(|| "-".to_string(), |price| format!("${price}")))
        .collect();
    format!("{name} | {}", cells.join(" | "))
}

#[cfg(test)]
mod tests {
    use detailbook_core::catalog::ServiceCatalog;

    use super::render_matrix;

    #[test]
    fn matrix_has_a_row_per_priced_selection() {
        let catalog = ServiceCatalog::standard();
        let rendered = render_matrix(&catalog);
        let expected_rows: usize = catalog
            .categories()
            .iter()
            .map(|category| category.sub_services.len() + usize::from(category.direct_prices.is_some()))
            .sum();

        assert_eq!(rendered.lines().count(), expected_rows + 1);
        assert!(rendered.lines().next().is_some_and(|header| header.contains("大型車/SUV")));
    }
}
