use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::GitHubConfig;
use crate::error::{Result, WrappedError};
use crate::types::{PrReview, PrReviewComment, PullRequest, PullRequestState, Repository};

const REVIEW_FIELDS: &str = r#"
fragment ReviewFields on PullRequestReview {
  id
  state
  author {
    login
  }
  comments(first: $commentsFirst) {
    pageInfo {
      endCursor
      hasNextPage
    }
    nodes {
      id
      replyTo {
        id
      }
      author {
        login
      }
    }
  }
}"#;

const CONTRIBUTIONS_QUERY: &str = r#"
query WrappedPullRequests($from: DateTime, $to: DateTime, $after: String, $first: Int!, $reviewsFirst: Int!, $commentsFirst: Int!) {
  viewer {
    contributionsCollection(from: $from, to: $to) {
      pullRequestContributions(first: $first, after: $after) {
        totalCount
        pageInfo {
          endCursor
          hasNextPage
        }
        nodes {
          pullRequest {
            id
            number
            title
            repository {
              owner {
                login
              }
              name
              isPrivate
            }
            commits {
              totalCount
            }
            comments {
              totalCount
            }
            state
            createdAt
            closedAt
            mergedAt
            reviews(first: $reviewsFirst) {
              pageInfo {
                endCursor
                hasNextPage
              }
              nodes {
                ...ReviewFields
              }
            }
          }
        }
      }
    }
  }
}"#;

const REVIEWS_QUERY: &str = r#"
query WrappedPullRequestReviews($id: ID!, $after: String, $reviewsFirst: Int!, $commentsFirst: Int!) {
  node(id: $id) {
    ... on PullRequest {
      reviews(first: $reviewsFirst, after: $after) {
        pageInfo {
          endCursor
          hasNextPage
        }
        nodes {
          ...ReviewFields
        }
      }
    }
  }
}"#;

pub fn contributions_query() -> String {
    format!("{}\n{}", CONTRIBUTIONS_QUERY, REVIEW_FIELDS)
}

pub fn reviews_query() -> String {
    format!("{}\n{}", REVIEWS_QUERY, REVIEW_FIELDS)
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

impl PageInfo {
    /// The cursor to continue from, if there is another page.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.has_next_page {
            self.end_cursor.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContributionsData {
    pub viewer: Viewer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionsCollection {
    pub pull_request_contributions: PullRequestContributions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestContributions {
    pub total_count: u64,
    pub page_info: PageInfo,
    pub nodes: Vec<ContributionNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionNode {
    pub pull_request: PullRequestNode,
}

#[derive(Debug, Deserialize)]
pub struct LoginNode {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct IdNode {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountNode {
    pub total_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub owner: LoginNode,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub repository: RepositoryNode,
    pub commits: CountNode,
    pub comments: CountNode,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub reviews: ReviewConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewConnection {
    pub page_info: PageInfo,
    pub nodes: Vec<ReviewNode>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewNode {
    pub id: String,
    pub state: String,
    pub author: Option<LoginNode>,
    pub comments: ReviewCommentConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCommentConnection {
    pub page_info: PageInfo,
    pub nodes: Vec<ReviewCommentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCommentNode {
    pub id: String,
    pub reply_to: Option<IdNode>,
    pub author: Option<LoginNode>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewsData {
    pub node: Option<ReviewsNode>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewsNode {
    pub reviews: ReviewConnection,
}

// Deleted accounts come back as a null author; GitHub shows them as "ghost".
fn author_login(author: Option<LoginNode>) -> String {
    author
        .map(|a| a.login)
        .unwrap_or_else(|| "ghost".to_string())
}

pub fn convert_review(review: ReviewNode) -> PrReview {
    if review.comments.page_info.has_next_page {
        warn!(
            "Review {} has more comments than fit in one page, extra comments are ignored",
            review.id
        );
    }

    PrReview {
        id: review.id,
        author: author_login(review.author),
        state: review.state,
        comments: review
            .comments
            .nodes
            .into_iter()
            .map(|comment| PrReviewComment {
                id: comment.id,
                author: author_login(comment.author),
                reply_to: comment.reply_to.map(|r| r.id),
            })
            .collect(),
    }
}

pub fn convert_reviews(reviews: Vec<ReviewNode>) -> Vec<PrReview> {
    reviews.into_iter().map(convert_review).collect()
}

pub fn pull_request_url(host: &str, repository: &Repository, number: u64) -> String {
    format!(
        "https://{}/{}/{}/pull/{}",
        host, repository.owner, repository.name, number
    )
}

/// Converts a contributions node. The returned cursor is set when the pull
/// request has more reviews than the first page held.
pub fn convert_pull_request(
    node: PullRequestNode,
    host: &str,
) -> Result<(PullRequest, Option<String>)> {
    let state: PullRequestState = node.state.parse()?;
    let repository = Repository::new(node.repository.owner.login, node.repository.name);
    let url = pull_request_url(host, &repository, node.number);
    let next_reviews = node.reviews.page_info.next_cursor().map(str::to_string);

    let pr = PullRequest {
        id: node.id,
        number: node.number,
        title: node.title,
        repository,
        is_private: node.repository.is_private,
        created_at: node.created_at,
        closed_at: node.closed_at,
        merged_at: node.merged_at,
        state,
        commits_count: node.commits.total_count,
        comments_count: node.comments.total_count,
        reviews: convert_reviews(node.reviews.nodes),
        url,
    };

    Ok((pr, next_reviews))
}

/// Minimal GitHub GraphQL client on top of reqwest.
pub struct GraphQlClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl GraphQlClient {
    pub fn new(config: &GitHubConfig, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.graphql_url.clone(),
            token: token.into(),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|e| WrappedError::ConfigError(format!("Invalid token: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        Ok(headers)
    }
}

/// Sends one GraphQL document and hands back the raw response body.
#[async_trait]
pub trait GraphQlTransport {
    async fn post(&self, query: &str, variables: Value) -> Result<Value>;
}

#[async_trait]
impl GraphQlTransport for GraphQlClient {
    async fn post(&self, query: &str, variables: Value) -> Result<Value> {
        debug!("POST {} variables={}", self.endpoint, variables);

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(WrappedError::AuthError(
                "GitHub rejected the token (401)".to_string(),
            ));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(WrappedError::ApiError(format!(
                "GitHub GraphQL API request failed ({}): {}",
                status, error_text
            )));
        }

        Ok(response.json().await?)
    }
}

/// Runs `query` over `transport` and decodes its `data` into `T`.
pub async fn run_query<T, Q>(transport: &Q, query: &str, variables: Value) -> Result<T>
where
    T: DeserializeOwned,
    Q: GraphQlTransport + ?Sized + Sync,
{
    let body = transport.post(query, variables).await?;
    let body: GraphQlResponse<T> = serde_json::from_value(body)?;
    parse_graphql_response(body)
}

pub fn parse_graphql_response<T>(body: GraphQlResponse<T>) -> Result<T> {
    if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
        return Err(WrappedError::GraphQl(
            errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    body.data
        .ok_or_else(|| WrappedError::ApiError("GraphQL response has no data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
      "data": {
        "viewer": {
          "contributionsCollection": {
            "pullRequestContributions": {
              "totalCount": 2,
              "pageInfo": { "endCursor": "Y3Vyc29yOjI=", "hasNextPage": true },
              "nodes": [
                {
                  "pullRequest": {
                    "id": "PR_kwDOA1",
                    "number": 42,
                    "title": "Add wrapped report",
                    "repository": { "owner": { "login": "octo" }, "name": "hello", "isPrivate": false },
                    "commits": { "totalCount": 3 },
                    "comments": { "totalCount": 5 },
                    "state": "MERGED",
                    "createdAt": "2023-01-01T00:00:00Z",
                    "closedAt": "2023-01-03T00:00:00Z",
                    "mergedAt": "2023-01-03T00:00:00Z",
                    "reviews": {
                      "pageInfo": { "endCursor": "cmV2OjE=", "hasNextPage": true },
                      "nodes": [
                        {
                          "id": "PRR_1",
                          "state": "APPROVED",
                          "author": { "login": "alice" },
                          "comments": {
                            "pageInfo": { "endCursor": null, "hasNextPage": false },
                            "nodes": [
                              { "id": "C_1", "replyTo": null, "author": { "login": "alice" } },
                              { "id": "C_2", "replyTo": { "id": "C_1" }, "author": null }
                            ]
                          }
                        }
                      ]
                    }
                  }
                },
                {
                  "pullRequest": {
                    "id": "PR_kwDOA2",
                    "number": 7,
                    "title": "WIP",
                    "repository": { "owner": { "login": "acme" }, "name": "secret", "isPrivate": true },
                    "commits": { "totalCount": 1 },
                    "comments": { "totalCount": 0 },
                    "state": "OPEN",
                    "createdAt": "2023-05-01T10:00:00Z",
                    "closedAt": null,
                    "mergedAt": null,
                    "reviews": {
                      "pageInfo": { "endCursor": null, "hasNextPage": false },
                      "nodes": []
                    }
                  }
                }
              ]
            }
          }
        }
      }
    }"#;

    #[test]
    fn test_decode_contributions_page() {
        let body: GraphQlResponse<ContributionsData> = serde_json::from_str(PAGE).unwrap();
        let data = parse_graphql_response(body).unwrap();
        let contributions = data.viewer.contributions_collection.pull_request_contributions;
        assert_eq!(contributions.total_count, 2);
        assert_eq!(contributions.page_info.next_cursor(), Some("Y3Vyc29yOjI="));

        let mut nodes = contributions.nodes.into_iter();
        let (merged, more_reviews) =
            convert_pull_request(nodes.next().unwrap().pull_request, "github.com").unwrap();
        assert_eq!(merged.state, PullRequestState::Merged);
        assert_eq!(merged.url, "https://github.com/octo/hello/pull/42");
        assert_eq!(merged.commits_count, 3);
        assert_eq!(merged.comments_count, 5);
        assert_eq!(more_reviews.as_deref(), Some("cmV2OjE="));
        assert_eq!(merged.reviews.len(), 1);
        assert_eq!(merged.reviews[0].author, "alice");
        assert_eq!(merged.reviews[0].comments[1].author, "ghost");
        assert_eq!(merged.reviews[0].comments[1].reply_to.as_deref(), Some("C_1"));

        let (open, more_reviews) =
            convert_pull_request(nodes.next().unwrap().pull_request, "ghe.example.com").unwrap();
        assert_eq!(open.state, PullRequestState::Open);
        assert!(open.is_private);
        assert_eq!(open.merged_at, None);
        assert_eq!(open.url, "https://ghe.example.com/acme/secret/pull/7");
        assert_eq!(more_reviews, None);
    }

    #[test]
    fn test_unknown_state_is_an_error() {
        let body: GraphQlResponse<ContributionsData> =
            serde_json::from_str(&PAGE.replace("\"OPEN\"", "\"DRAFT\"")).unwrap();
        let data = parse_graphql_response(body).unwrap();
        let node = data
            .viewer
            .contributions_collection
            .pull_request_contributions
            .nodes
            .into_iter()
            .nth(1)
            .unwrap();
        assert!(matches!(
            convert_pull_request(node.pull_request, "github.com"),
            Err(WrappedError::InvalidState(_))
        ));
    }

    #[test]
    fn test_graphql_errors_surface() {
        let body: GraphQlResponse<ContributionsData> = serde_json::from_str(
            r#"{"data": null, "errors": [{"message": "Something went wrong"}]}"#,
        )
        .unwrap();
        match parse_graphql_response(body) {
            Err(WrappedError::GraphQl(messages)) => {
                assert_eq!(messages, vec!["Something went wrong".to_string()])
            }
            other => panic!("expected GraphQl error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_data_is_an_error() {
        let body: GraphQlResponse<ContributionsData> =
            serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(matches!(
            parse_graphql_response(body),
            Err(WrappedError::ApiError(_))
        ));
    }

    #[test]
    fn test_queries_include_fragment() {
        assert!(contributions_query().contains("fragment ReviewFields"));
        assert!(reviews_query().contains("node(id: $id)"));
    }
}
