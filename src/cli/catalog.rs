use anyhow::Result;

use crate::core::catalog::Catalog;
use crate::core::terminal::{GuideSection, print_info};

pub fn run_templates(category: Option<&str>) -> Result<()> {
    let catalog = Catalog::builtin()?;
    let templates = catalog.list_templates(category);
    if templates.is_empty() {
        print_info(&format!(
            "No templates in category '{}'. Categories: {}",
            category.unwrap_or_default(),
            catalog.categories().join(", ")
        ));
        return Ok(());
    }

    for cat in catalog.categories() {
        let in_cat: Vec<_> = templates.iter().filter(|t| t.category == cat).collect();
        if in_cat.is_empty() {
            continue;
        }
        let mut section = GuideSection::new(&format!("Templates: {}", cat));
        for t in in_cat {
            section = section.command(&t.id, &format!("{} ({})", t.name, t.complexity));
        }
        section.print();
    }
    println!();
    print_info("Deploy one with 'workflow-hub deploy <template-id>'.");
    Ok(())
}

pub fn run_connectors(category: Option<&str>, search: Option<&str>) -> Result<()> {
    let catalog = Catalog::builtin()?;
    let connectors = catalog.list_connectors(category, search);
    if connectors.is_empty() {
        print_info("No connectors match.");
        return Ok(());
    }

    let mut section = GuideSection::new(&format!("Connectors ({})", connectors.len()));
    for c in connectors {
        section = section.command(&c.name, &format!("{} · {}", c.category, c.auth_type));
    }
    section.print();
    println!();
    Ok(())
}
