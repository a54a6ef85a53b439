use crate::api::FriendService;
use crate::model::{CrawlOutcome, EdgeRecord, Expansion, Person, UserId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Default pause between consecutive remote calls. The service throttles
/// clients that exceed roughly three requests per second.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(330);

/// Two-hop friend crawler.
///
/// Fetches the root's direct friends, then expands each direct friend (up to
/// an optional cap) one level further. Requests are issued strictly one at a
/// time with a fixed pause before each expansion.
pub struct Crawler<S> {
    service: S,
    max_friends: Option<usize>,
    request_delay: Duration,
    progress_callback: Option<ProgressCallback>,
}

impl<S: FriendService> Crawler<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            max_friends: None,
            request_delay: DEFAULT_REQUEST_DELAY,
            progress_callback: None,
        }
    }

    /// Caps how many direct friends are expanded to the second degree.
    /// `None` expands all of them.
    pub fn with_max_friends(mut self, max_friends: Option<usize>) -> Self {
        self.max_friends = max_friends;
        self
    }

    pub fn with_request_delay(mut self, request_delay: Duration) -> Self {
        self.request_delay = request_delay;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Crawls out from `root`.
    ///
    /// A failed root fetch terminates the whole crawl and yields an empty
    /// outcome. A failed expansion drops only that branch, recorded as
    /// [`Expansion::Skipped`]; the direct friend itself keeps its root edge.
    pub async fn crawl(&self, root: UserId) -> CrawlOutcome {
        info!("starting crawl of {root}");

        let friends = match self.service.list_friends(root).await {
            Ok(friends) => friends,
            Err(e) => {
                warn!("friend list of {root} is not visible: {e}");
                return CrawlOutcome::default();
            }
        };

        let mut outcome = CrawlOutcome::default();

        for entry in &friends {
            outcome.persons.insert(Person::from_entry(entry, 1));
            outcome.direct_friends.insert(entry.id);
        }

        let cap = match self.max_friends {
            Some(max) if max < friends.len() => max,
            _ => friends.len(),
        };
        debug!("{} direct friends, expanding {cap}", friends.len());

        for (i, entry) in friends.iter().take(cap).enumerate() {
            if let Some(ref callback) = self.progress_callback {
                callback(i, entry.display_name());
            }

            tokio::time::sleep(self.request_delay).await;

            match self.service.list_friends(entry.id).await {
                Ok(friends_of_friend) => {
                    let mut discovered = 0;
                    for fof in &friends_of_friend {
                        if outcome.persons.insert(Person::from_entry(fof, 2)) {
                            discovered += 1;
                        }
                        outcome.edges.push(EdgeRecord::new(entry.id, fof.id));
                    }

                    debug!("{}: {discovered} new profiles", entry.display_name());
                    outcome.expansions.push(Expansion::Expanded {
                        friend: entry.id,
                        discovered,
                    });
                }
                Err(e) => {
                    warn!("skipping expansion of {}: {e}", entry.display_name());
                    outcome.expansions.push(Expansion::Skipped {
                        friend: entry.id,
                        error: e.to_string(),
                    });
                }
            }

            // The root edge is recorded even when the expansion failed, so
            // every capped direct friend stays connected to the root.
            outcome.edges.push(EdgeRecord::new(root, entry.id));
        }

        info!(
            "crawl complete: {} profiles, {} connections",
            outcome.persons.len(),
            outcome.edges.len()
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HttpFriendService;
    use serde_json::{Value, json};
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn friend(id: u64, name: &str) -> Value {
        json!({"id": id, "first_name": name, "last_name": "Test"})
    }

    fn friends_response(items: Vec<Value>) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "response": {"count": items.len(), "items": items}
        }))
    }

    fn private_profile_response() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "error": {"error_code": 30, "error_msg": "This profile is private"}
        }))
    }

    async fn mount_friends(server: &MockServer, user: u64, items: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/method/friends.get"))
            .and(query_param("user_id", user.to_string()))
            .respond_with(friends_response(items))
            .mount(server)
            .await;
    }

    async fn crawler_for(server: &MockServer) -> Crawler<HttpFriendService> {
        let service = HttpFriendService::new("test-token".to_string())
            .with_base_url(Url::parse(&server.uri()).unwrap());

        Crawler::new(service).with_request_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn caps_expansion_but_records_all_direct_friends() {
        let server = MockServer::start().await;

        // Root 1 has direct friends 10, 11, 12; only the first two expand.
        mount_friends(
            &server,
            1,
            vec![friend(10, "A"), friend(11, "B"), friend(12, "C")],
        )
        .await;
        mount_friends(&server, 10, vec![friend(20, "D"), friend(21, "E")]).await;
        mount_friends(&server, 11, vec![friend(22, "F"), friend(23, "G")]).await;

        let outcome = crawler_for(&server)
            .await
            .with_max_friends(Some(2))
            .crawl(UserId(1))
            .await;

        // All three direct friends are recorded at depth 1, pre-cap.
        assert_eq!(outcome.direct_friends.len(), 3);
        assert_eq!(outcome.persons.count_at_depth(1), 3);
        assert_eq!(outcome.persons.count_at_depth(2), 4);

        // Root edges exist for the capped friends only; 12 stays detached.
        assert!(outcome.edges.contains(&EdgeRecord::new(UserId(1), UserId(10))));
        assert!(outcome.edges.contains(&EdgeRecord::new(UserId(1), UserId(11))));
        assert!(!outcome.edges.contains(&EdgeRecord::new(UserId(1), UserId(12))));

        assert_eq!(outcome.expansions.len(), 2);
    }

    #[tokio::test]
    async fn deduplicates_rediscovered_profiles() {
        let server = MockServer::start().await;

        // 30 is reachable through both direct friends; 11 shows up again in
        // 10's friend list. Neither may produce a second person.
        mount_friends(&server, 1, vec![friend(10, "A"), friend(11, "B")]).await;
        mount_friends(&server, 10, vec![friend(30, "Shared"), friend(11, "B")]).await;
        mount_friends(&server, 11, vec![friend(30, "Shared")]).await;

        let outcome = crawler_for(&server).await.crawl(UserId(1)).await;

        assert_eq!(outcome.persons.len(), 3);
        assert_eq!(outcome.persons.get(&UserId(11)).unwrap().depth, 1);
        assert_eq!(outcome.persons.get(&UserId(30)).unwrap().depth, 2);

        // Every discovery still yields an edge record, duplicates included.
        assert!(outcome.edges.contains(&EdgeRecord::new(UserId(10), UserId(30))));
        assert!(outcome.edges.contains(&EdgeRecord::new(UserId(11), UserId(30))));
        assert!(outcome.edges.contains(&EdgeRecord::new(UserId(10), UserId(11))));

        let expanded: Vec<usize> = outcome
            .expansions
            .iter()
            .map(|e| match e {
                Expansion::Expanded { discovered, .. } => *discovered,
                Expansion::Skipped { .. } => panic!("no branch should be skipped"),
            })
            .collect();
        assert_eq!(expanded, vec![1, 0]);
    }

    #[tokio::test]
    async fn failed_expansion_is_skipped_but_keeps_the_root_edge() {
        let server = MockServer::start().await;

        mount_friends(&server, 1, vec![friend(10, "A"), friend(11, "B")]).await;
        mount_friends(&server, 10, vec![friend(20, "D")]).await;
        Mock::given(method("GET"))
            .and(path("/method/friends.get"))
            .and(query_param("user_id", "11"))
            .respond_with(private_profile_response())
            .mount(&server)
            .await;

        let outcome = crawler_for(&server).await.crawl(UserId(1)).await;

        // B is still a depth-1 person with a root edge, but contributed no
        // second-degree profiles.
        assert_eq!(outcome.persons.get(&UserId(11)).unwrap().depth, 1);
        assert!(outcome.edges.contains(&EdgeRecord::new(UserId(1), UserId(11))));
        assert_eq!(outcome.persons.count_at_depth(2), 1);

        let skipped: Vec<&UserId> = outcome.skipped().map(|(id, _)| id).collect();
        assert_eq!(skipped, vec![&UserId(11)]);
    }

    #[tokio::test]
    async fn root_failure_yields_an_empty_outcome() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/method/friends.get"))
            .respond_with(private_profile_response())
            .mount(&server)
            .await;

        let outcome = crawler_for(&server).await.crawl(UserId(1)).await;

        assert!(outcome.is_empty());
        assert!(outcome.direct_friends.is_empty());
        assert!(outcome.expansions.is_empty());
    }

    #[tokio::test]
    async fn every_capped_friend_gets_exactly_one_root_edge() {
        let server = MockServer::start().await;

        mount_friends(&server, 1, vec![friend(10, "A"), friend(11, "B")]).await;
        mount_friends(&server, 10, vec![]).await;
        Mock::given(method("GET"))
            .and(path("/method/friends.get"))
            .and(query_param("user_id", "11"))
            .respond_with(private_profile_response())
            .mount(&server)
            .await;

        let outcome = crawler_for(&server).await.crawl(UserId(1)).await;

        for friend_id in [UserId(10), UserId(11)] {
            let root_edges = outcome
                .edges
                .iter()
                .filter(|e| **e == EdgeRecord::new(UserId(1), friend_id))
                .count();
            assert_eq!(root_edges, 1, "friend {friend_id} should have one root edge");
        }
    }

    #[tokio::test]
    async fn progress_callback_reports_each_expansion() {
        let server = MockServer::start().await;

        mount_friends(&server, 1, vec![friend(10, "Alice"), friend(11, "Boris")]).await;
        mount_friends(&server, 10, vec![]).await;
        mount_friends(&server, 11, vec![]).await;

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let outcome = crawler_for(&server)
            .await
            .with_progress_callback(Arc::new(move |i: usize, name: String| {
                seen_clone.lock().unwrap().push((i, name));
            }))
            .crawl(UserId(1))
            .await;

        assert!(!outcome.is_empty());
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![(0, "Alice Test".to_string()), (1, "Boris Test".to_string())]
        );
    }
}
