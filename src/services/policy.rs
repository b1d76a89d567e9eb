use crate::domain::Tag;
use crate::errors::AppError;
use crate::services::logger::Logger;
use crate::stores::Store;
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;

/// Where tag policies come from when a request only carries tag ids.
#[async_trait]
pub trait TagSource: Send + Sync {
    async fn get_tag(&self, id: &str) -> Result<Option<Tag>, AppError>;
}

pub struct StoreTagSource {
    store: Arc<dyn Store>,
}

impl StoreTagSource {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TagSource for StoreTagSource {
    async fn get_tag(&self, id: &str) -> Result<Option<Tag>, AppError> {
        self.store.get_tag(id)
    }
}

#[derive(Clone)]
pub struct TagPolicyLoader {
    source: Arc<dyn TagSource>,
    logger: Logger,
}

impl TagPolicyLoader {
    pub fn new(source: Arc<dyn TagSource>, logger: Logger) -> Self {
        Self {
            source,
            logger: logger.child("policy"),
        }
    }

    /// Fetches all tags concurrently. The result follows `tag_ids` order, not
    /// completion order, because merge precedence depends on it.
    pub async fn load(&self, tag_ids: &[String]) -> Result<Vec<Tag>, AppError> {
        let lookups = tag_ids.iter().map(|id| self.source.get_tag(id));
        let results = join_all(lookups).await;

        let mut tags = Vec::with_capacity(tag_ids.len());
        for (id, result) in tag_ids.iter().zip(results) {
            match result? {
                Some(tag) => tags.push(tag),
                None => self
                    .logger
                    .debug("Skipping unknown tag", Some(&json!({ "tag_id": id }))),
            }
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TagColor;
    use std::collections::HashMap;
    use std::time::Duration;

    struct SlowSource {
        tags: HashMap<String, (Tag, u64)>,
    }

    #[async_trait]
    impl TagSource for SlowSource {
        async fn get_tag(&self, id: &str) -> Result<Option<Tag>, AppError> {
            match self.tags.get(id) {
                Some((tag, delay_ms)) => {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                    Ok(Some(tag.clone()))
                }
                None => Ok(None),
            }
        }
    }

    fn tag(name: &str) -> Tag {
        let mut tag = Tag::new(name, TagColor::Blue);
        tag.id = name.to_string();
        tag
    }

    #[tokio::test]
    async fn keeps_requested_order_regardless_of_completion() {
        let mut tags = HashMap::new();
        tags.insert("slow".to_string(), (tag("slow"), 40));
        tags.insert("fast".to_string(), (tag("fast"), 0));
        let loader = TagPolicyLoader::new(Arc::new(SlowSource { tags }), Logger::quiet("test"));

        let ids = vec!["slow".to_string(), "missing".to_string(), "fast".to_string()];
        let loaded = loader.load(&ids).await.expect("load");
        let names: Vec<&str> = loaded.iter().map(|tag| tag.name.as_str()).collect();
        assert_eq!(names, vec!["slow", "fast"]);
    }
}
