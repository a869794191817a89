// src/services/topic_catalog.rs
//
// Catalog sources for the seeder: the fixed YouTube topic registry and
// the per-region video category list served by the remote.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{Category, Topic};
use crate::error::AppResult;
use crate::integrations::RemoteSource;

/// Where a reference catalog comes from
#[async_trait]
pub trait CatalogSource<E>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_catalog(&self) -> AppResult<Vec<E>>;
}

/// (parent id, parent name, children)
type TopicFamily = (&'static str, &'static str, &'static [(&'static str, &'static str)]);

const TOPIC_REGISTRY: &[TopicFamily] = &[
    (
        "/m/04rlf",
        "Music",
        &[
            ("/m/02mscn", "Christian music"),
            ("/m/0ggq0m", "Classical music"),
            ("/m/01lyv", "Country"),
            ("/m/02lkt", "Electronic music"),
            ("/m/0glt670", "Hip hop music"),
            ("/m/05rwpb", "Independent music"),
            ("/m/03_d0", "Jazz"),
            ("/m/028sqc", "Music of Asia"),
            ("/m/0g293", "Music of Latin America"),
            ("/m/064t9", "Pop music"),
            ("/m/06cqb", "Reggae"),
            ("/m/06j6l", "Rhythm and blues"),
            ("/m/06by7", "Rock music"),
            ("/m/0gywn", "Soul music"),
        ],
    ),
    (
        "/m/0bzvm2",
        "Gaming",
        &[
            ("/m/025zzc", "Action game"),
            ("/m/02ntfj", "Action-adventure game"),
            ("/m/0b1vjn", "Casual game"),
            ("/m/02hygl", "Music video game"),
            ("/m/04q1x3q", "Puzzle video game"),
            ("/m/01sjng", "Racing video game"),
            ("/m/0403l3g", "Role-playing video game"),
            ("/m/021bp2", "Simulation video game"),
            ("/m/022dc6", "Sports game"),
            ("/m/03hf_rm", "Strategy video game"),
        ],
    ),
    (
        "/m/06ntj",
        "Sports",
        &[
            ("/m/0jm_", "American football"),
            ("/m/018jz", "Baseball"),
            ("/m/018w8", "Basketball"),
            ("/m/01cgz", "Boxing"),
            ("/m/09xp_", "Cricket"),
            ("/m/02vx4", "Football"),
            ("/m/037hz", "Golf"),
            ("/m/03tmr", "Ice hockey"),
            ("/m/01h7lh", "Mixed martial arts"),
            ("/m/0410tth", "Motorsport"),
            ("/m/07bs0", "Tennis"),
            ("/m/07_53", "Volleyball"),
        ],
    ),
    (
        "/m/02jjt",
        "Entertainment",
        &[
            ("/m/09kqc", "Humor"),
            ("/m/02vxn", "Movies"),
            ("/m/05qjc", "Performing arts"),
            ("/m/066wd", "Professional wrestling"),
            ("/m/0f2f9", "TV shows"),
        ],
    ),
    (
        "/m/019_rr",
        "Lifestyle",
        &[
            ("/m/032tl", "Fashion"),
            ("/m/027x7n", "Fitness"),
            ("/m/02wbm", "Food"),
            ("/m/03glg", "Hobby"),
            ("/m/068hy", "Pets"),
            ("/m/041xxh", "Physical attractiveness"),
            ("/m/07c1v", "Technology"),
            ("/m/07bxq", "Tourism"),
            ("/m/07yv9", "Vehicles"),
        ],
    ),
    (
        "/m/098wr",
        "Society",
        &[
            ("/m/09s1f", "Business"),
            ("/m/0kt51", "Health"),
            ("/m/01h6rj", "Military"),
            ("/m/05qt0", "Politics"),
            ("/m/06bvp", "Religion"),
        ],
    ),
    ("/m/01k8wb", "Knowledge", &[]),
];

/// The built-in YouTube topic registry, parents listed before their children
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticTopicCatalog;

impl StaticTopicCatalog {
    pub fn topics() -> Vec<Topic> {
        TOPIC_REGISTRY
            .iter()
            .flat_map(|&(parent_id, parent_name, children)| {
                std::iter::once(Topic::new(parent_id, parent_name, None)).chain(
                    children
                        .iter()
                        .map(move |&(id, name)| Topic::new(id, name, Some(parent_id))),
                )
            })
            .collect()
    }
}

#[async_trait]
impl CatalogSource<Topic> for StaticTopicCatalog {
    fn name(&self) -> &'static str {
        "topics"
    }

    async fn fetch_catalog(&self) -> AppResult<Vec<Topic>> {
        Ok(Self::topics())
    }
}

/// Video categories for one region, fetched from the remote
pub struct RemoteCategoryCatalog {
    remote: Arc<dyn RemoteSource>,
    region_code: String,
}

impl RemoteCategoryCatalog {
    pub fn new(remote: Arc<dyn RemoteSource>, region_code: impl Into<String>) -> Self {
        Self {
            remote,
            region_code: region_code.into(),
        }
    }
}

#[async_trait]
impl CatalogSource<Category> for RemoteCategoryCatalog {
    fn name(&self) -> &'static str {
        "categories"
    }

    async fn fetch_catalog(&self) -> AppResult<Vec<Category>> {
        Ok(self.remote.fetch_video_categories(&self.region_code).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{validate_catalog_entry, CatalogEntry};
    use crate::integrations::MockRemoteSource;
    use std::collections::HashSet;

    #[test]
    fn test_registry_ids_are_unique_and_valid() {
        let topics = StaticTopicCatalog::topics();
        let ids: HashSet<&str> = topics.iter().map(|t| t.code()).collect();

        assert_eq!(ids.len(), topics.len());
        for topic in &topics {
            validate_catalog_entry(topic).unwrap();
        }
    }

    #[test]
    fn test_parents_precede_children() {
        let topics = StaticTopicCatalog::topics();
        let mut seen = HashSet::new();
        for topic in &topics {
            if let Some(parent) = topic.parent_code() {
                assert!(seen.contains(parent), "{} listed before its parent", topic.topic_id);
            }
            seen.insert(topic.code());
        }
    }

    #[tokio::test]
    async fn test_remote_categories_use_configured_region() {
        let mut remote = MockRemoteSource::new();
        remote
            .expect_fetch_video_categories()
            .withf(|region| region.to_string() == "GB")
            .times(1)
            .returning(|_| Ok(vec![Category::new("10", "Music", true)]));

        let catalog = RemoteCategoryCatalog::new(Arc::new(remote), "GB");
        let categories = catalog.fetch_catalog().await.unwrap();

        assert_eq!(categories.len(), 1);
        assert_eq!(catalog.name(), "categories");
    }
}
