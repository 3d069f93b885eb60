use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    Credentials,
    DeployError,
    DeployResult,
    DeploymentAccepted,
    DeploymentJob,
    DeploymentRequest,
    RepositoryReference,
    RepositoryUrlParser,
    Session,
    SubdomainLabel,
};
use crate::infrastructure::{
    IdentityGate,
    ProviderError,
    RepositoryAccess,
    SubdomainRegistry,
};

use super::JobSubmitter;

pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Stages a deployment request passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    Start,
    AuthChecked,
    InputValidated,
    SubdomainValidated,
    RepositoryParsed,
    SubdomainAvailable,
    RepositoryAuthorized,
    JobSubmitted,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::AuthChecked => "auth-checked",
            Self::InputValidated => "input-validated",
            Self::SubdomainValidated => "subdomain-validated",
            Self::RepositoryParsed => "repository-parsed",
            Self::SubdomainAvailable => "subdomain-available",
            Self::RepositoryAuthorized => "repository-authorized",
            Self::JobSubmitted => "job-submitted",
        };
        f.write_str(name)
    }
}

/// Tracks how far a single request got, for logging on failure.
struct PipelineRun {
    stage: PipelineStage,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            stage: PipelineStage::Start,
        }
    }

    fn advance(&mut self, stage: PipelineStage) {
        tracing::trace!(from = %self.stage, to = %stage, "Deployment pipeline advanced");
        self.stage = stage;
    }

    fn fail(&self, error: DeployError) -> DeployError {
        match &error {
            DeployError::Internal(cause) => tracing::error!(
                reached = %self.stage,
                code = error.code(),
                cause = %cause,
                "Deployment request failed"
            ),
            _ if error.is_validation() => tracing::debug!(
                reached = %self.stage,
                code = error.code(),
                "Deployment request invalid"
            ),
            _ => tracing::info!(
                reached = %self.stage,
                code = error.code(),
                "Deployment request rejected"
            ),
        }
        error
    }
}

/// Gives a claimed subdomain back if the request is dropped mid-flight,
/// e.g. when the client disconnects during the provider call.
struct ClaimGuard {
    subdomains: Arc<dyn SubdomainRegistry>,
    label: Option<SubdomainLabel>,
}

impl ClaimGuard {
    fn new(subdomains: Arc<dyn SubdomainRegistry>, label: SubdomainLabel) -> Self {
        Self {
            subdomains,
            label: Some(label),
        }
    }

    fn disarm(&mut self) {
        self.label = None;
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        let Some(label) = self.label.take() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(subdomain = %label, "Subdomain claim abandoned outside a runtime");
            return;
        };
        let subdomains = Arc::clone(&self.subdomains);
        handle.spawn(async move {
            match subdomains.release(&label).await {
                Ok(()) => tracing::debug!(subdomain = %label, "Abandoned subdomain claim released"),
                Err(e) => tracing::warn!(
                    subdomain = %label,
                    error = %e,
                    "Failed to release subdomain claim"
                ),
            }
        });
    }
}

/// Runs the intake pipeline for deployment requests.
///
/// Holds no per-request state; one instance serves all requests concurrently.
pub struct DeploymentService {
    identity: Arc<dyn IdentityGate>,
    repositories: Arc<dyn RepositoryAccess>,
    subdomains: Arc<dyn SubdomainRegistry>,
    submitter: JobSubmitter,
    url_parser: RepositoryUrlParser,
    resolve_timeout: Duration,
}

impl DeploymentService {
    pub fn new(
        identity: Arc<dyn IdentityGate>, repositories: Arc<dyn RepositoryAccess>,
        subdomains: Arc<dyn SubdomainRegistry>, submitter: JobSubmitter,
    ) -> Self {
        Self {
            identity,
            repositories,
            subdomains,
            submitter,
            url_parser: RepositoryUrlParser::default(),
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }

    /// Accept repository URLs on `url_parser`'s host instead of github.com.
    pub fn with_url_parser(mut self, url_parser: RepositoryUrlParser) -> Self {
        self.url_parser = url_parser;
        self
    }

    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    pub fn submitter(&self) -> &JobSubmitter {
        &self.submitter
    }

    pub fn provider_name(&self) -> &'static str {
        self.repositories.provider_name()
    }

    /// Authenticates the caller, then decodes `body` as a
    /// [`DeploymentRequest`] and runs the rest of the pipeline.
    pub async fn submit(
        &self, credentials: &Credentials, body: &[u8],
    ) -> DeployResult<DeploymentAccepted> {
        let mut run = PipelineRun::new();
        let session = self
            .authenticate(credentials)
            .await
            .map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::AuthChecked);

        let request = DeploymentRequest::from_json(body).map_err(|e| run.fail(e))?;
        self.process(run, session, request).await
    }

    /// Same as [`submit`](Self::submit) for callers that already decoded
    /// the request.
    pub async fn submit_request(
        &self, credentials: &Credentials, request: DeploymentRequest,
    ) -> DeployResult<DeploymentAccepted> {
        let mut run = PipelineRun::new();
        let session = self
            .authenticate(credentials)
            .await
            .map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::AuthChecked);

        self.process(run, session, request).await
    }

    async fn authenticate(&self, credentials: &Credentials) -> DeployResult<Session> {
        let session = self
            .identity
            .current_session(credentials)
            .await
            .ok_or(DeployError::Unauthorized)?;

        if session.token().is_none() {
            return Err(DeployError::Unauthorized);
        }

        Ok(session)
    }

    async fn process(
        &self, mut run: PipelineRun, session: Session, request: DeploymentRequest,
    ) -> DeployResult<DeploymentAccepted> {
        let input = request.require_fields().map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::InputValidated);

        // Local checks run before anything touches the network.
        let subdomain = SubdomainLabel::parse(&input.subdomain).map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::SubdomainValidated);

        let repository = self
            .url_parser
            .parse(&input.repo_url)
            .map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::RepositoryParsed);

        self.claim(&subdomain).await.map_err(|e| run.fail(e))?;
        let mut guard = ClaimGuard::new(Arc::clone(&self.subdomains), subdomain.clone());
        run.advance(PipelineStage::SubdomainAvailable);

        let outcome = self
            .deploy_claimed(&mut run, &session, repository, &subdomain)
            .await;
        guard.disarm();

        match outcome {
            Ok(accepted) => {
                tracing::info!(
                    owner = %accepted.details.owner,
                    repo = %accepted.details.repo,
                    subdomain = %accepted.details.subdomain,
                    deployment_url = %accepted.deployment_url,
                    user = session.user.as_deref().unwrap_or("unknown"),
                    "Deployment queued"
                );
                Ok(accepted)
            }
            Err(e) => {
                if let Err(release_error) = self.subdomains.release(&subdomain).await {
                    tracing::warn!(
                        subdomain = %subdomain,
                        error = %release_error,
                        "Failed to release subdomain claim"
                    );
                }
                Err(run.fail(e))
            }
        }
    }

    /// Everything after the subdomain has been claimed. Any error here must
    /// give the claim back.
    async fn deploy_claimed(
        &self, run: &mut PipelineRun, session: &Session, repository: RepositoryReference,
        subdomain: &SubdomainLabel,
    ) -> DeployResult<DeploymentAccepted> {
        let token = session.token().cloned().ok_or(DeployError::Unauthorized)?;

        self.authorize_repository(&repository, &token).await?;
        run.advance(PipelineStage::RepositoryAuthorized);

        let job = DeploymentJob::new(repository, subdomain.clone(), token, session.user.clone());
        let accepted = self.submitter.submit(job).await?;
        run.advance(PipelineStage::JobSubmitted);

        Ok(accepted)
    }

    async fn claim(&self, subdomain: &SubdomainLabel) -> DeployResult<()> {
        if self.subdomains.try_claim(subdomain).await? {
            Ok(())
        } else {
            Err(DeployError::SubdomainUnavailable)
        }
    }

    async fn authorize_repository(
        &self, repository: &RepositoryReference, token: &secrecy::SecretString,
    ) -> DeployResult<()> {
        let lookup = self.repositories.get_repository(repository, token);
        let result = match tokio::time::timeout(self.resolve_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };

        match result {
            Ok(metadata) => {
                tracing::debug!(
                    repository = %repository,
                    private = ?metadata.private,
                    default_branch = ?metadata.default_branch,
                    "Repository access confirmed"
                );
                Ok(())
            }
            Err(e) => {
                match &e {
                    ProviderError::NotFound
                    | ProviderError::Forbidden
                    | ProviderError::Unauthorized => {
                        tracing::debug!(
                            provider = self.repositories.provider_name(),
                            repository = %repository,
                            reason = %e,
                            "Repository lookup refused"
                        );
                    }
                    _ => {
                        tracing::warn!(
                            provider = self.repositories.provider_name(),
                            repository = %repository,
                            reason = %e,
                            "Repository lookup failed"
                        );
                    }
                }
                Err(DeployError::RepositoryNotFoundOrNoAccess)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };
    use std::sync::Mutex;

    use async_trait::async_trait;
    use secrecy::{
        ExposeSecret,
        SecretString,
    };

    use super::*;
    use crate::domain::RepositoryMetadata;
    use crate::infrastructure::{
        ChannelJobQueue,
        JobQueue,
        OpenSubdomainRegistry,
        ProviderResult,
        QueueError,
        QueueResult,
        ReservedSubdomainRegistry,
    };

    const BASE_DOMAIN: &str = "pages.test";

    struct FakeIdentity {
        session: Option<Session>,
        calls: AtomicUsize,
    }

    impl FakeIdentity {
        fn with_token(token: &str) -> Self {
            Self {
                session: Some(Session::new(
                    Some("alice".to_string()),
                    Some(SecretString::from(token.to_string())),
                )),
                calls: AtomicUsize::new(0),
            }
        }

        fn tokenless() -> Self {
            Self {
                session: Some(Session::new(Some("alice".to_string()), None)),
                calls: AtomicUsize::new(0),
            }
        }

        fn anonymous() -> Self {
            Self {
                session: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl IdentityGate for FakeIdentity {
        async fn current_session(&self, _credentials: &Credentials) -> Option<Session> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.session.clone()
        }
    }

    struct FakeRepositories {
        outcome: ProviderResult<RepositoryMetadata>,
        delay: Option<Duration>,
        calls: AtomicUsize,
        seen_tokens: Mutex<Vec<String>>,
    }

    impl FakeRepositories {
        fn granting() -> Self {
            Self::with_outcome(Ok(RepositoryMetadata {
                full_name: Some("alice/site".to_string()),
                private: Some(false),
                default_branch: Some("main".to_string()),
            }))
        }

        fn with_outcome(outcome: ProviderResult<RepositoryMetadata>) -> Self {
            Self {
                outcome,
                delay: None,
                calls: AtomicUsize::new(0),
                seen_tokens: Mutex::new(Vec::new()),
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::granting()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RepositoryAccess for FakeRepositories {
        async fn get_repository(
            &self, _reference: &RepositoryReference, token: &SecretString,
        ) -> ProviderResult<RepositoryMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_tokens
                .lock()
                .unwrap()
                .push(token.expose_secret().to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome.clone()
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }

    #[derive(Default)]
    struct RecordingQueue {
        jobs: Mutex<Vec<DeploymentJob>>,
        fail: bool,
    }

    #[async_trait]
    impl JobQueue for RecordingQueue {
        async fn submit(&self, job: DeploymentJob) -> QueueResult<()> {
            if self.fail {
                return Err(QueueError::Closed);
            }
            self.jobs.lock().unwrap().push(job);
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "recording"
        }
    }

    struct Harness {
        identity: Arc<FakeIdentity>,
        repositories: Arc<FakeRepositories>,
        queue: Arc<RecordingQueue>,
        service: DeploymentService,
    }

    fn harness_with(
        identity: FakeIdentity, repositories: FakeRepositories, queue: RecordingQueue,
        subdomains: Arc<dyn SubdomainRegistry>,
    ) -> Harness {
        let identity = Arc::new(identity);
        let repositories = Arc::new(repositories);
        let queue = Arc::new(queue);
        let service = DeploymentService::new(
            identity.clone(),
            repositories.clone(),
            subdomains,
            JobSubmitter::new(queue.clone(), BASE_DOMAIN),
        );
        Harness {
            identity,
            repositories,
            queue,
            service,
        }
    }

    fn harness(identity: FakeIdentity, repositories: FakeRepositories) -> Harness {
        harness_with(
            identity,
            repositories,
            RecordingQueue::default(),
            Arc::new(OpenSubdomainRegistry),
        )
    }

    fn body(repo_url: &str, subdomain: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "repoUrl": repo_url,
            "subdomain": subdomain,
        }))
        .unwrap()
    }

    fn credentials() -> Credentials {
        Credentials::bearer("ignored-by-fake")
    }

    #[tokio::test]
    async fn test_valid_request_is_queued() {
        let h = harness(FakeIdentity::with_token("gho_alice"), FakeRepositories::granting());

        let accepted = h
            .service
            .submit(&credentials(), &body("https://github.com/alice/site", "alice-site"))
            .await
            .unwrap();

        assert_eq!(accepted.deployment_url, "https://alice-site.pages.test");
        assert_eq!(accepted.details.owner, "alice");
        assert_eq!(accepted.details.repo, "site");
        assert_eq!(accepted.details.subdomain, "alice-site");

        let jobs = h.queue.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].owner(), "alice");
        assert_eq!(jobs[0].repo(), "site");
        assert_eq!(jobs[0].subdomain.as_str(), "alice-site");
        assert_eq!(jobs[0].access_token.expose_secret(), "gho_alice");
        assert_eq!(jobs[0].requested_by.as_deref(), Some("alice"));

        assert_eq!(
            h.repositories.seen_tokens.lock().unwrap().as_slice(),
            ["gho_alice".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_session_is_unauthorized() {
        let h = harness(FakeIdentity::anonymous(), FakeRepositories::granting());

        let result = h
            .service
            .submit(&Credentials::anonymous(), &body("https://github.com/alice/site", "ok"))
            .await;

        assert_eq!(result, Err(DeployError::Unauthorized));
        assert_eq!(h.identity.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.repositories.calls(), 0);
        assert!(h.queue.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_without_token_is_unauthorized() {
        let h = harness(FakeIdentity::tokenless(), FakeRepositories::granting());

        let result = h
            .service
            .submit(&credentials(), &body("https://github.com/alice/site", "ok"))
            .await;

        assert_eq!(result, Err(DeployError::Unauthorized));
        assert_eq!(h.repositories.calls(), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_before_body_is_decoded() {
        let h = harness(FakeIdentity::anonymous(), FakeRepositories::granting());

        let result = h.service.submit(&credentials(), b"{{{ not json").await;

        assert_eq!(result, Err(DeployError::Unauthorized));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let h = harness(FakeIdentity::with_token("t"), FakeRepositories::granting());

        let result = h.service.submit(&credentials(), b"{{{ not json").await;

        assert_eq!(result, Err(DeployError::MalformedRequest));
        assert_eq!(h.repositories.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_checked_before_format() {
        let h = harness(FakeIdentity::with_token("t"), FakeRepositories::granting());

        let result = h
            .service
            .submit(&credentials(), br#"{"subdomain": "Bad_Name!"}"#)
            .await;
        assert_eq!(result, Err(DeployError::MissingFields));

        let result = h
            .service
            .submit(&credentials(), &body("", "alice-site"))
            .await;
        assert_eq!(result, Err(DeployError::MissingFields));

        assert_eq!(h.repositories.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_repository_url_makes_no_provider_call() {
        let h = harness(FakeIdentity::with_token("t"), FakeRepositories::granting());

        let result = h
            .service
            .submit(&credentials(), &body("not-a-url", "ok"))
            .await;

        assert_eq!(result, Err(DeployError::InvalidRepositoryUrl));
        assert_eq!(h.repositories.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_subdomain_makes_no_provider_call() {
        let h = harness(FakeIdentity::with_token("t"), FakeRepositories::granting());

        let result = h
            .service
            .submit(
                &credentials(),
                &body("https://github.com/alice/site", "Bad_Name!"),
            )
            .await;

        assert_eq!(result, Err(DeployError::InvalidSubdomain));
        assert_eq!(h.repositories.calls(), 0);
    }

    #[tokio::test]
    async fn test_subdomain_checked_before_repository_url() {
        let h = harness(FakeIdentity::with_token("t"), FakeRepositories::granting());

        let result = h
            .service
            .submit(&credentials(), &body("not-a-url", "Bad_Name!"))
            .await;

        assert_eq!(result, Err(DeployError::InvalidSubdomain));
    }

    #[tokio::test]
    async fn test_provider_refusals_collapse_to_not_found() {
        for outcome in [
            ProviderError::NotFound,
            ProviderError::Forbidden,
            ProviderError::Unauthorized,
            ProviderError::RateLimited,
            ProviderError::Network("connection reset".to_string()),
            ProviderError::Api("HTTP 500".to_string()),
        ] {
            let h = harness(
                FakeIdentity::with_token("t"),
                FakeRepositories::with_outcome(Err(outcome)),
            );

            let result = h
                .service
                .submit(&credentials(), &body("https://github.com/alice/site", "ok"))
                .await;

            assert_eq!(result, Err(DeployError::RepositoryNotFoundOrNoAccess));
            assert_eq!(h.repositories.calls(), 1);
            assert!(h.queue.jobs.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let identity = Arc::new(FakeIdentity::with_token("t"));
        let repositories = Arc::new(FakeRepositories::slow(Duration::from_secs(5)));
        let (queue, _rx) = ChannelJobQueue::new(4);
        let service = DeploymentService::new(
            identity,
            repositories.clone(),
            Arc::new(OpenSubdomainRegistry),
            JobSubmitter::new(Arc::new(queue), BASE_DOMAIN),
        )
        .with_resolve_timeout(Duration::from_millis(20));

        let result = service
            .submit(&credentials(), &body("https://github.com/alice/site", "ok"))
            .await;

        assert_eq!(result, Err(DeployError::RepositoryNotFoundOrNoAccess));
        assert_eq!(repositories.calls(), 1);
    }

    #[tokio::test]
    async fn test_queue_failure_is_submission_failed() {
        let h = harness_with(
            FakeIdentity::with_token("t"),
            FakeRepositories::granting(),
            RecordingQueue {
                fail: true,
                ..RecordingQueue::default()
            },
            Arc::new(OpenSubdomainRegistry),
        );

        let result = h
            .service
            .submit(&credentials(), &body("https://github.com/alice/site", "ok"))
            .await;

        assert_eq!(result, Err(DeployError::SubmissionFailed));
        assert_eq!(h.repositories.calls(), 1);
    }

    #[tokio::test]
    async fn test_reserved_subdomain_is_unavailable() {
        let h = harness_with(
            FakeIdentity::with_token("t"),
            FakeRepositories::granting(),
            RecordingQueue::default(),
            Arc::new(ReservedSubdomainRegistry::new(["www"])),
        );

        let result = h
            .service
            .submit(&credentials(), &body("https://github.com/alice/site", "www"))
            .await;

        assert_eq!(result, Err(DeployError::SubdomainUnavailable));
        assert_eq!(h.repositories.calls(), 0);
    }

    #[tokio::test]
    async fn test_claimed_subdomain_cannot_be_reused() {
        let h = harness_with(
            FakeIdentity::with_token("t"),
            FakeRepositories::granting(),
            RecordingQueue::default(),
            Arc::new(ReservedSubdomainRegistry::new(Vec::<String>::new())),
        );
        let request = body("https://github.com/alice/site", "alice-site");

        assert!(h.service.submit(&credentials(), &request).await.is_ok());
        assert_eq!(
            h.service.submit(&credentials(), &request).await,
            Err(DeployError::SubdomainUnavailable)
        );
        assert_eq!(h.queue.jobs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_for_one_subdomain() {
        let h = harness_with(
            FakeIdentity::with_token("t"),
            FakeRepositories::slow(Duration::from_millis(50)),
            RecordingQueue::default(),
            Arc::new(ReservedSubdomainRegistry::new(Vec::<String>::new())),
        );
        let first = body("https://github.com/alice/site", "alice-site");
        let second = body("https://github.com/mallory/evil", "alice-site");
        let credentials = credentials();

        let (a, b) = tokio::join!(
            h.service.submit(&credentials, &first),
            h.service.submit(&credentials, &second),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| r == &Err(DeployError::SubdomainUnavailable)));
        assert_eq!(h.repositories.calls(), 1);
        assert_eq!(h.queue.jobs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_deployment_releases_subdomain() {
        let registry = Arc::new(ReservedSubdomainRegistry::new(Vec::<String>::new()));
        let request = body("https://github.com/alice/site", "alice-site");

        let refused = harness_with(
            FakeIdentity::with_token("t"),
            FakeRepositories::with_outcome(Err(ProviderError::NotFound)),
            RecordingQueue::default(),
            registry.clone(),
        );
        assert_eq!(
            refused.service.submit(&credentials(), &request).await,
            Err(DeployError::RepositoryNotFoundOrNoAccess)
        );

        let unqueued = harness_with(
            FakeIdentity::with_token("t"),
            FakeRepositories::granting(),
            RecordingQueue {
                fail: true,
                ..RecordingQueue::default()
            },
            registry.clone(),
        );
        assert_eq!(
            unqueued.service.submit(&credentials(), &request).await,
            Err(DeployError::SubmissionFailed)
        );

        let h = harness_with(
            FakeIdentity::with_token("t"),
            FakeRepositories::granting(),
            RecordingQueue::default(),
            registry.clone(),
        );
        assert!(h.service.submit(&credentials(), &request).await.is_ok());
        assert_eq!(h.queue.jobs.lock().unwrap().len(), 1);

        let label = SubdomainLabel::parse("alice-site").unwrap();
        assert!(!registry.is_available(&label).await.unwrap());
    }

    #[tokio::test]
    async fn test_abandoned_request_releases_subdomain() {
        let registry = Arc::new(ReservedSubdomainRegistry::new(Vec::<String>::new()));
        let h = harness_with(
            FakeIdentity::with_token("t"),
            FakeRepositories::slow(Duration::from_secs(5)),
            RecordingQueue::default(),
            registry.clone(),
        );
        let label = SubdomainLabel::parse("alice-site").unwrap();
        let credentials = credentials();
        let request = body("https://github.com/alice/site", "alice-site");

        let pending = h.service.submit(&credentials, &request);
        assert!(tokio::time::timeout(Duration::from_millis(20), pending)
            .await
            .is_err());
        assert_eq!(h.repositories.calls(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(registry.is_available(&label).await.unwrap());
        assert!(h.queue.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_request_skips_decoding() {
        let h = harness(FakeIdentity::with_token("t"), FakeRepositories::granting());

        let accepted = h
            .service
            .submit_request(
                &credentials(),
                DeploymentRequest::new("git@github.com:alice/site.git", "alice-site"),
            )
            .await;

        // scp-style URLs use ':' after the host and do not match
        assert_eq!(accepted, Err(DeployError::InvalidRepositoryUrl));

        let accepted = h
            .service
            .submit_request(
                &credentials(),
                DeploymentRequest::new("https://github.com/alice/site.git", "alice-site"),
            )
            .await
            .unwrap();
        assert_eq!(accepted.details.repo, "site");
    }

    #[test]
    fn test_stages_are_ordered() {
        assert!(PipelineStage::Start < PipelineStage::AuthChecked);
        assert!(PipelineStage::SubdomainValidated < PipelineStage::RepositoryParsed);
        assert!(PipelineStage::RepositoryAuthorized < PipelineStage::JobSubmitted);
        assert_eq!(PipelineStage::JobSubmitted.to_string(), "job-submitted");
    }
}
