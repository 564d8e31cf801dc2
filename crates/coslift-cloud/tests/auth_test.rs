use coslift_cloud::auth::{AuthError, Credential, ExchangeFailure, IamClient};
use coslift_cloud::executor::HttpExecutor;
use coslift_cloud::transport::TransportError;
use mockall::mock;
use secrecy::{ExposeSecret, SecretString};

mock! {
    Executor {}

    impl HttpExecutor for Executor {
        async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<String, TransportError>;
        async fn post_json(
            &self,
            url: &str,
            bearer: &str,
            body: &serde_json::Value,
        ) -> Result<(), TransportError>;
        async fn put(
            &self,
            url: &str,
            headers: &[(String, String)],
            body: Vec<u8>,
        ) -> Result<(), TransportError>;
        async fn delete(&self, url: &str, headers: &[(String, String)]) -> Result<(), TransportError>;
    }
}

const IAM: &str = "https://iam.test";

fn secret(s: &str) -> SecretString {
    SecretString::from(s)
}

fn field<'a>(form: &'a [(String, String)], name: &str) -> Option<&'a str> {
    form.iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

// ── Method selection ──

#[tokio::test]
async fn no_inputs_is_no_credential() {
    let client = IamClient::with_executor(MockExecutor::new(), IAM);

    let result = client.resolve(None, None, None).await;

    assert!(matches!(result, Err(AuthError::NoCredential)));
}

#[tokio::test]
async fn empty_strings_count_as_absent() {
    let client = IamClient::with_executor(MockExecutor::new(), IAM);

    let result = client
        .resolve(Some(""), Some(&secret("")), Some(&secret("")))
        .await;

    assert!(matches!(result, Err(AuthError::NoCredential)));
}

#[tokio::test]
async fn oidc_token_without_profile_is_not_enough() {
    let client = IamClient::with_executor(MockExecutor::new(), IAM);

    let result = client.resolve(None, None, Some(&secret("oidc.jwt"))).await;

    assert!(matches!(result, Err(AuthError::NoCredential)));
}

#[tokio::test]
async fn api_key_is_used_without_network_call() {
    // No expectations: any HTTP call would panic.
    let client = IamClient::with_executor(MockExecutor::new(), IAM);

    let credential = client
        .resolve(None, Some(&secret("abcdefghijklmnopqrstuvwxyz")), None)
        .await
        .unwrap();

    match credential {
        Credential::ApiKey(key) => assert_eq!(key.expose_secret(), "abcdefghijklmnopqrstuvwxyz"),
        other => panic!("expected api key, got {other:?}"),
    }
}

#[tokio::test]
async fn profile_without_oidc_token_falls_back_to_api_key() {
    let client = IamClient::with_executor(MockExecutor::new(), IAM);

    let credential = client
        .resolve(Some("Profile-123"), Some(&secret("abcdefghijklmnopqrstuvwxyz")), None)
        .await
        .unwrap();

    assert_eq!(credential.method(), "api-key");
}

#[tokio::test]
async fn oidc_exchange_posts_cr_token_grant() {
    let mut mock = MockExecutor::new();
    mock.expect_post_form()
        .withf(|url, form| {
            url == "https://iam.test/identity/token"
                && field(form, "grant_type") == Some("urn:ibm:params:oauth:grant-type:cr-token")
                && field(form, "cr_token") == Some("oidc.jwt")
                && field(form, "profile_id") == Some("Profile-123")
        })
        .times(1)
        .returning(|_, _| Ok(r#"{"access_token":"iam-token","expires_in":3600}"#.to_owned()));

    let client = IamClient::with_executor(mock, IAM);
    let credential = client
        .resolve(Some("Profile-123"), None, Some(&secret("oidc.jwt")))
        .await
        .unwrap();

    match credential {
        Credential::Bearer {
            access_token,
            expires_in,
        } => {
            assert_eq!(access_token.expose_secret(), "iam-token");
            assert_eq!(expires_in, Some(3600));
        }
        other => panic!("expected bearer, got {other:?}"),
    }
}

#[tokio::test]
async fn oidc_takes_priority_over_api_key() {
    let mut mock = MockExecutor::new();
    mock.expect_post_form()
        .times(1)
        .returning(|_, _| Ok(r#"{"access_token":"iam-token"}"#.to_owned()));

    let client = IamClient::with_executor(mock, IAM);
    let credential = client
        .resolve(
            Some("Profile-123"),
            Some(&secret("abcdefghijklmnopqrstuvwxyz")),
            Some(&secret("oidc.jwt")),
        )
        .await
        .unwrap();

    assert!(matches!(
        credential,
        Credential::Bearer {
            expires_in: None,
            ..
        }
    ));
}

// ── Exchange failures ──

#[tokio::test]
async fn missing_access_token_is_auth_exchange_error() {
    let mut mock = MockExecutor::new();
    mock.expect_post_form()
        .returning(|_, _| Ok(r#"{"expires_in":3600}"#.to_owned()));

    let client = IamClient::with_executor(mock, IAM);
    let result = client
        .resolve(Some("P"), None, Some(&secret("oidc.jwt")))
        .await;

    assert!(matches!(
        result,
        Err(AuthError::AuthExchange {
            source: ExchangeFailure::MissingAccessToken
        })
    ));
}

#[tokio::test]
async fn empty_access_token_is_auth_exchange_error() {
    let mut mock = MockExecutor::new();
    mock.expect_post_form()
        .returning(|_, _| Ok(r#"{"access_token":""}"#.to_owned()));

    let client = IamClient::with_executor(mock, IAM);
    let result = client
        .resolve(Some("P"), None, Some(&secret("oidc.jwt")))
        .await;

    assert!(matches!(
        result,
        Err(AuthError::AuthExchange {
            source: ExchangeFailure::MissingAccessToken
        })
    ));
}

#[tokio::test]
async fn http_error_is_auth_exchange_error() {
    let mut mock = MockExecutor::new();
    mock.expect_post_form().returning(|url, _| {
        Err(TransportError::Status {
            url: url.to_owned(),
            status: 400,
            body: r#"{"errorMessage":"Provided token is invalid"}"#.to_owned(),
        })
    });

    let client = IamClient::with_executor(mock, IAM);
    let err = client
        .resolve(Some("P"), None, Some(&secret("oidc.jwt")))
        .await
        .unwrap_err();

    match err {
        AuthError::AuthExchange {
            source: ExchangeFailure::Transport(e),
        } => assert_eq!(e.status(), Some(400)),
        other => panic!("expected transport failure, got {other:?}"),
    }
}

#[tokio::test]
async fn oidc_failure_does_not_fall_back_to_api_key() {
    let mut mock = MockExecutor::new();
    mock.expect_post_form()
        .times(1)
        .returning(|_, _| Ok("not json".to_owned()));

    let client = IamClient::with_executor(mock, IAM);
    let result = client
        .resolve(
            Some("P"),
            Some(&secret("abcdefghijklmnopqrstuvwxyz")),
            Some(&secret("oidc.jwt")),
        )
        .await;

    assert!(matches!(
        result,
        Err(AuthError::AuthExchange {
            source: ExchangeFailure::InvalidJson(_)
        })
    ));
}

// ── API key exchange ──

#[tokio::test]
async fn api_key_exchange_posts_apikey_grant() {
    let mut mock = MockExecutor::new();
    mock.expect_post_form()
        .withf(|url, form| {
            url == "https://iam.test/identity/token"
                && field(form, "grant_type") == Some("urn:ibm:params:oauth:grant-type:apikey")
                && field(form, "apikey") == Some("my-api-key")
        })
        .times(1)
        .returning(|_, _| Ok(r#"{"access_token":"iam-token","expires_in":1200}"#.to_owned()));

    let client = IamClient::with_executor(mock, IAM);
    let token = client.exchange_api_key(&secret("my-api-key")).await.unwrap();

    assert_eq!(token.access_token.expose_secret(), "iam-token");
    assert_eq!(token.expires_in, Some(1200));
}
