pub mod deploy;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const TEMPLATES_JSON: &str = include_str!("templates.json");
const CONNECTORS_JSON: &str = include_str!("connectors.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub complexity: String,
    pub triggers: Vec<String>,
    pub actions: Vec<String>,
    /// Posted to the engine unchanged on deploy.
    pub engine_definition: Value,
}

/// A template without its engine definition, for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub complexity: String,
    pub triggers: Vec<String>,
    pub actions: Vec<String>,
}

impl From<&TemplateDefinition> for TemplateSummary {
    fn from(t: &TemplateDefinition) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            category: t.category.clone(),
            description: t.description.clone(),
            complexity: t.complexity.clone(),
            triggers: t.triggers.clone(),
            actions: t.actions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDefinition {
    pub name: String,
    pub description: String,
    pub category: String,
    pub auth_type: String,
    /// Engine node type this connector authenticates.
    pub node_type: String,
    pub setup_steps: Vec<String>,
    pub example_use: String,
}

impl ConnectorDefinition {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// Built-in nodes like the webhook trigger declare `None (...)`.
    pub fn requires_credentials(&self) -> bool {
        !self.auth_type.starts_with("None")
    }
}

/// Lowercased name keeping only ASCII letters and digits.
pub fn slugify(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn matches_category(category: Option<&str>, value: &str) -> bool {
    match category.map(str::trim) {
        None | Some("") | Some("all") => true,
        Some(wanted) => wanted == value,
    }
}

/// The built-in template and connector tables. Immutable after load.
#[derive(Debug, Clone)]
pub struct Catalog {
    templates: Vec<TemplateDefinition>,
    connectors: Vec<ConnectorDefinition>,
}

impl Catalog {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            templates: serde_json::from_str(TEMPLATES_JSON)
                .context("embedded template table is invalid")?,
            connectors: serde_json::from_str(CONNECTORS_JSON)
                .context("embedded connector table is invalid")?,
        })
    }

    pub fn list_templates(&self, category: Option<&str>) -> Vec<TemplateSummary> {
        self.templates
            .iter()
            .filter(|t| matches_category(category, &t.category))
            .map(TemplateSummary::from)
            .collect()
    }

    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for t in &self.templates {
            if !seen.contains(&t.category) {
                seen.push(t.category.clone());
            }
        }
        seen
    }

    pub fn get_template(&self, id: &str) -> Option<&TemplateDefinition> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn list_connectors(
        &self,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Vec<&ConnectorDefinition> {
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        self.connectors
            .iter()
            .filter(|c| matches_category(category, &c.category))
            .filter(|c| match &needle {
                Some(n) => {
                    c.name.to_lowercase().contains(n) || c.description.to_lowercase().contains(n)
                }
                None => true,
            })
            .collect()
    }

    pub fn find_connector(&self, slug: &str) -> Option<&ConnectorDefinition> {
        let wanted = slugify(slug);
        self.connectors.iter().find(|c| c.slug() == wanted)
    }

    pub fn connector_for_node(&self, node_type: &str) -> Option<&ConnectorDefinition> {
        self.connectors.iter().find(|c| c.node_type == node_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn embedded_tables_load() {
        let catalog = catalog();
        assert_eq!(catalog.list_templates(None).len(), 12);
        assert_eq!(catalog.list_connectors(None, None).len(), 31);
    }

    #[test]
    fn template_ids_are_unique() {
        let catalog = catalog();
        let mut ids: Vec<_> = catalog.list_templates(None).into_iter().map(|t| t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 12);
    }

    #[test]
    fn category_filter_and_all() {
        let catalog = catalog();
        let crm = catalog.list_templates(Some("crm"));
        assert_eq!(crm.len(), 2);
        assert!(crm.iter().all(|t| t.category == "crm"));
        assert_eq!(catalog.list_templates(Some("all")).len(), 12);
        assert!(catalog.list_templates(Some("nope")).is_empty());
    }

    #[test]
    fn categories_keep_catalog_order() {
        assert_eq!(
            catalog().categories(),
            vec!["crm", "communication", "data", "marketing", "dev"]
        );
    }

    #[test]
    fn get_template_includes_definition() {
        let catalog = catalog();
        let t = catalog.get_template("lead-to-crm").unwrap();
        assert!(t.engine_definition["nodes"].is_array());
        assert!(catalog.get_template("missing").is_none());
    }

    #[test]
    fn connector_search_matches_name_or_description() {
        let catalog = catalog();
        let hits = catalog.list_connectors(None, Some("SLACK"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Slack");

        let crm = catalog.list_connectors(Some("crm"), None);
        let names: Vec<_> = crm.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["HubSpot", "Salesforce", "Pipedrive"]);

        let http: Vec<_> = catalog
            .list_connectors(Some("dev"), Some("http"))
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(http, vec!["Webhook", "HTTP Request"]);
    }

    #[test]
    fn slugs_ignore_punctuation_and_case() {
        let catalog = catalog();
        assert_eq!(catalog.find_connector("googlesheets").unwrap().name, "Google Sheets");
        assert_eq!(catalog.find_connector("Email-IMAP").unwrap().name, "Email (IMAP)");
        assert_eq!(catalog.find_connector("awss3").unwrap().name, "AWS S3");
        assert!(catalog.find_connector("fax").is_none());
    }

    #[test]
    fn slugs_drop_non_ascii_characters() {
        assert_eq!(slugify("Slacké"), "slack");
        assert_eq!(slugify("Ünïcode 42"), "ncode42");
        assert_eq!(catalog().find_connector("slacké").unwrap().name, "Slack");
    }

    #[test]
    fn node_types_map_back_to_connectors() {
        let catalog = catalog();
        let webhook = catalog.connector_for_node("n8n-nodes-base.webhook").unwrap();
        assert!(!webhook.requires_credentials());
        let hubspot = catalog.connector_for_node("n8n-nodes-base.hubspot").unwrap();
        assert!(hubspot.requires_credentials());
        assert!(catalog.connector_for_node("n8n-nodes-base.if").is_none());
    }
}
