use async_trait::async_trait;
use notion_client::{Block, CreatePageRequest, NotionClient, PropertyValue};
use tracing::{error, info};

use serpscope_common::{AnalysisReport, Config, Result, SearchResult, SerpscopeError};

use crate::traits::ReportStore;

// Property and heading names of the report database.
const PROP_TITLE: &str = "タイトル";
const PROP_TARGET: &str = "ターゲット層";
const PROP_INTENT: &str = "検索意図";
const PROP_KEYWORDS: &str = "重要キーワード";
const PROP_SOURCES: &str = "参考URL";
const HEADING_REPORT: &str = "詳細分析レポート";
const HEADING_LOGIC: &str = "勝因のロジック";

const MISSING_DATABASE_ID: &str = "DATABASE_ID is not configured";

/// Persistence stage: one Notion database row per report.
pub struct NotionReportStore {
    client: NotionClient,
    database_id: Option<String>,
}

impl NotionReportStore {
    pub fn new(client: NotionClient, database_id: Option<String>) -> Self {
        Self {
            client,
            database_id,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            NotionClient::new(&config.notion_token),
            config.notion_database_id.clone(),
        )
    }

    fn database_id(&self) -> Result<&str> {
        self.database_id
            .as_deref()
            .ok_or_else(|| SerpscopeError::Config(MISSING_DATABASE_ID.to_string()))
    }
}

/// Page body for one report: five properties, then the analysis and the
/// winning-logic conclusion each under its own heading.
pub fn build_page_request(
    database_id: &str,
    report: &AnalysisReport,
    sources: &[SearchResult],
) -> CreatePageRequest {
    let links = sources
        .iter()
        .map(|r| r.link.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    CreatePageRequest::in_database(database_id)
        .property(PROP_TITLE, PropertyValue::title(&report.title))
        .property(PROP_TARGET, PropertyValue::rich_text(&report.target))
        .property(PROP_INTENT, PropertyValue::rich_text(&report.intent))
        .property(PROP_KEYWORDS, PropertyValue::rich_text(&report.keywords))
        .property(PROP_SOURCES, PropertyValue::rich_text(&links))
        .child(Block::heading_1(HEADING_REPORT))
        .child(Block::paragraph(&report.content))
        .child(Block::heading_2(HEADING_LOGIC))
        .child(Block::paragraph(&report.logic))
}

#[async_trait]
impl ReportStore for NotionReportStore {
    fn ensure_configured(&self) -> Result<()> {
        self.database_id().map(|_| ())
    }

    async fn create_report(
        &self,
        report: &AnalysisReport,
        sources: &[SearchResult],
    ) -> Result<String> {
        let database_id = self.database_id()?;
        info!(title = %report.title, sources = sources.len(), "Saving report to Notion");

        let request = build_page_request(database_id, report, sources);
        let page = self.client.create_page(&request).await.map_err(|e| {
            error!(error = %e, "Notion page creation failed");
            if e.is_object_not_found() {
                SerpscopeError::DatabaseNotFound
            } else {
                SerpscopeError::upstream("Notion", e)
            }
        })?;

        info!(page_id = %page.id, url = %page.url, "Report saved");
        Ok(page.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_report, search_results};

    #[test]
    fn page_request_matches_database_schema() {
        let report = sample_report("Running shoes");
        let sources = search_results(3);
        let value = serde_json::to_value(build_page_request("db-123", &report, &sources)).unwrap();

        assert_eq!(value["parent"]["database_id"], "db-123");
        let props = &value["properties"];
        assert_eq!(props[PROP_TITLE]["title"][0]["text"]["content"], "Running shoes");
        assert_eq!(props[PROP_TARGET]["rich_text"][0]["text"]["content"], report.target);
        assert_eq!(props[PROP_INTENT]["rich_text"][0]["text"]["content"], report.intent);
        assert_eq!(props[PROP_KEYWORDS]["rich_text"][0]["text"]["content"], report.keywords);
        assert_eq!(
            props[PROP_SOURCES]["rich_text"][0]["text"]["content"],
            "https://site1.example/\nhttps://site2.example/\nhttps://site3.example/"
        );

        let children = value["children"].as_array().unwrap();
        let types: Vec<&str> = children.iter().map(|b| b["type"].as_str().unwrap()).collect();
        assert_eq!(types, vec!["heading_1", "paragraph", "heading_2", "paragraph"]);
        assert_eq!(children[0]["heading_1"]["rich_text"][0]["text"]["content"], HEADING_REPORT);
        assert_eq!(children[1]["paragraph"]["rich_text"][0]["text"]["content"], report.content);
        assert_eq!(children[2]["heading_2"]["rich_text"][0]["text"]["content"], HEADING_LOGIC);
        assert_eq!(children[3]["paragraph"]["rich_text"][0]["text"]["content"], report.logic);
    }

    #[tokio::test]
    async fn missing_database_id_fails_before_network() {
        let store = NotionReportStore::new(
            NotionClient::new("secret").with_base_url("http://127.0.0.1:9"),
            None,
        );
        let err = store.ensure_configured().unwrap_err();
        assert_eq!(err.to_string(), "DATABASE_ID is not configured");

        let err = store
            .create_report(&sample_report("T"), &search_results(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SerpscopeError::Config(_)));
    }

    #[tokio::test]
    async fn unreachable_notion_is_upstream_error() {
        let store = NotionReportStore::new(
            NotionClient::new("secret").with_base_url("http://127.0.0.1:9"),
            Some("db".into()),
        );
        assert!(store.ensure_configured().is_ok());
        let err = store
            .create_report(&sample_report("T"), &search_results(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SerpscopeError::Upstream { service: "Notion", .. }));
    }
}
