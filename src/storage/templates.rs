//! Template storage

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::mapping::FormTemplate;

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Load a template by id
    async fn load(&self, fid: u64) -> Result<Option<FormTemplate>>;
}

/// In-memory template store
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<u64, FormTemplate>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, template: FormTemplate) {
        self.templates.write().await.insert(template.fid, template);
    }

    /// Add every template from a JSON array
    pub async fn load_json(&self, json: &str) -> Result<usize> {
        let templates: Vec<FormTemplate> = serde_json::from_str(json)?;
        let count = templates.len();

        let mut store = self.templates.write().await;
        for template in templates {
            store.insert(template.fid, template);
        }

        tracing::info!(count = count, "Loaded form templates");
        Ok(count)
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn load(&self, fid: u64) -> Result<Option<FormTemplate>> {
        Ok(self.templates.read().await.get(&fid).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_json() {
        let store = MemoryTemplateStore::new();
        let json = r#"[
            {
                "fid": 3,
                "uuid": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                "title": "Invoice [webform_submission:sid]",
                "pdf_uri": "public://fillpdf/invoice.pdf",
                "fields": [
                    { "pdf_key": "name", "value": "[webform_submission:values:name]" }
                ]
            }
        ]"#;

        assert_eq!(store.load_json(json).await.unwrap(), 1);

        let template = store.load(3).await.unwrap().unwrap();
        assert_eq!(template.fields.len(), 1);
        assert_eq!(template.fields[0].pdf_key, "name");
        assert!(template.replacements.is_empty());
        assert!(store.load(4).await.unwrap().is_none());
    }
}
