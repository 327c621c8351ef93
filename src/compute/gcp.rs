//! Compute Engine v1 REST implementation of [`ComputeApi`].
//!
//! Requests go through `reqwest`; the bearer token comes from `gcloud auth
//! print-access-token`, pointed at the configured service-account key.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::Mutex;

use super::api::ComputeApi;
use super::error::{ComputeError, ComputeResult};
use super::model::{
    DiskMetadata, DiskSpec, Operation, SnapshotMetadata, SnapshotSpec, VmMetadata, VmSpec,
};
use crate::constants::OPERATION_POLL_INTERVAL;
use crate::labels::SnapshotFilter;

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
const CMD_TIMEOUT: Duration = Duration::from_secs(120);
const CMD_RETRIES: usize = 3;
const CMD_RETRY_BACKOFF: Duration = Duration::from_millis(750);
/// `gcloud` tokens live for an hour; refresh well before that.
const TOKEN_TTL: Duration = Duration::from_secs(45 * 60);

const ENV_CREDENTIAL_FILE_OVERRIDE: &str = "CLOUDSDK_AUTH_CREDENTIAL_FILE_OVERRIDE";
const DEFAULT_NETWORK: &str = "global/networks/default";

struct CachedToken {
    value: String,
    fetched_at: Instant,
}

impl CachedToken {
    fn fresh(&self, now: Instant) -> Option<&str> {
        let age = now.saturating_duration_since(self.fetched_at);
        (age < TOKEN_TTL).then_some(self.value.as_str())
    }
}

/// Token and project lookups through the `gcloud` CLI.
pub struct GcloudAuth {
    gcloud_path: PathBuf,
    credentials: Option<PathBuf>,
    token: Mutex<Option<CachedToken>>,
}

impl GcloudAuth {
    /// Uses `gcloud` from `PATH`, authenticating as `credentials` when given.
    pub fn new(credentials: Option<PathBuf>) -> Self {
        Self {
            gcloud_path: PathBuf::from("gcloud"),
            credentials,
            token: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> Option<&Path> {
        self.credentials.as_deref()
    }

    /// Returns a bearer token, reusing the cached one until it ages out.
    pub async fn access_token(&self) -> ComputeResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().and_then(|t| t.fresh(Instant::now())) {
            return Ok(token.to_string());
        }

        let value = self
            .run_gcloud(&["auth", "print-access-token"], "gcloud auth print-access-token")
            .await?;
        *cached = Some(CachedToken {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    /// Drops the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        self.token.lock().await.take();
    }

    /// Project configured in the active `gcloud` configuration.
    pub async fn configured_project(&self) -> ComputeResult<String> {
        let project = self
            .run_gcloud(
                &["config", "get-value", "project", "--quiet"],
                "gcloud config get-value project",
            )
            .await?;
        if project.is_empty() || project == "(unset)" {
            return Err(ComputeError::Auth(
                "no project configured; pass --project or set one in gcloud".to_string(),
            ));
        }
        Ok(project)
    }

    async fn run_gcloud(&self, args: &[&str], label: &str) -> ComputeResult<String> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;

            let mut cmd = Command::new(&self.gcloud_path);
            cmd.args(args)
                .kill_on_drop(true)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
            // A missing key file falls back to the active gcloud account.
            if let Some(path) = self.credentials.as_ref().filter(|p| p.is_file()) {
                cmd.env(ENV_CREDENTIAL_FILE_OVERRIDE, path);
            }

            let child = cmd
                .spawn()
                .map_err(|e| ComputeError::Auth(format!("Failed to spawn {label}: {e}")))?;

            let output = match tokio::time::timeout(CMD_TIMEOUT, child.wait_with_output()).await {
                Ok(res) => res
                    .map_err(|e| ComputeError::Auth(format!("Failed waiting for {label}: {e}")))?,
                Err(_) => {
                    return Err(ComputeError::Auth(format!(
                        "{label} timed out after {:?}",
                        CMD_TIMEOUT
                    )));
                }
            };

            if output.status.success() {
                return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
            }

            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let err = ComputeError::Auth(format!("{label} failed: {stderr}"));

            if attempt >= CMD_RETRIES {
                return Err(err);
            }

            tracing::debug!(attempt, "{label} failed, retrying");
            tokio::time::sleep(CMD_RETRY_BACKOFF).await;
        }
    }
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    #[serde(default)]
    project_id: Option<String>,
}

/// Picks the project: explicit value, then the key file's `project_id`, then `gcloud`.
pub async fn resolve_project(
    explicit: Option<String>,
    auth: &GcloudAuth,
) -> ComputeResult<String> {
    if let Some(project) = explicit.filter(|p| !p.is_empty()) {
        return Ok(project);
    }

    if let Some(path) = auth.credentials() {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let key: ServiceAccountKey = serde_json::from_str(&content)?;
                if let Some(project) = key.project_id.filter(|p| !p.is_empty()) {
                    return Ok(project);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Credentials file not found");
            }
            Err(e) => return Err(e.into()),
        }
    }

    auth.configured_project().await
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    items: Vec<NamedItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct NamedItem {
    name: String,
}

#[derive(Serialize)]
struct Named<'a, T: Serialize> {
    name: &'a str,
    #[serde(flatten)]
    body: &'a T,
}

/// Compute Engine REST client bound to one project.
pub struct GcpComputeApi {
    http: HttpClient,
    api_base: String,
    project: String,
    auth: GcloudAuth,
}

impl GcpComputeApi {
    pub fn new(api_base: impl Into<String>, project: impl Into<String>, auth: GcloudAuth) -> Self {
        Self {
            http: HttpClient::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            api_base: api_base.into(),
            project: project.into(),
            auth,
        }
    }

    /// Resolves the project (see [`resolve_project`]) and builds a client.
    pub async fn connect(
        api_base: &str,
        project: Option<String>,
        credentials: Option<PathBuf>,
    ) -> ComputeResult<Self> {
        let auth = GcloudAuth::new(credentials);
        let project = resolve_project(project, &auth).await?;
        tracing::debug!(project = %project, api_base, "Using Compute Engine project");
        Ok(Self::new(api_base, project, auth))
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn zone_url(&self, zone: &str, tail: &str) -> String {
        format!(
            "{}/projects/{}/zones/{}/{}",
            self.api_base, self.project, zone, tail
        )
    }

    fn global_url(&self, tail: &str) -> String {
        format!("{}/projects/{}/global/{}", self.api_base, self.project, tail)
    }

    /// Sends with a bearer token. A 401 refreshes the token and retries once.
    async fn send(&self, request: RequestBuilder, resource: &str) -> ComputeResult<Response> {
        let retry = request.try_clone();
        let token = self.auth.access_token().await?;
        let mut response = request.bearer_auth(token).send().await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            && let Some(retry) = retry
        {
            tracing::debug!(resource, "Access token rejected, refreshing");
            self.auth.invalidate().await;
            let token = self.auth.access_token().await?;
            response = retry.bearer_auth(token).send().await?;
        }

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ComputeError::NotFound {
                resource: resource.to_string(),
            });
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|b| b.error.message)
            .unwrap_or(text);
        Err(ComputeError::Api {
            status: status.as_u16(),
            resource: resource.to_string(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, resource: &str) -> ComputeResult<T> {
        let response = self.send(self.http.get(url), resource).await?;
        Ok(response.json().await?)
    }

    async fn post_op<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: Option<&B>,
        resource: &str,
    ) -> ComputeResult<Operation> {
        let mut request = self.http.post(url);
        request = match body {
            Some(body) => request.json(body),
            None => request.header(reqwest::header::CONTENT_LENGTH, 0),
        };
        let response = self.send(request, resource).await?;
        Ok(response.json().await?)
    }

    async fn delete_op(&self, url: &str, resource: &str) -> ComputeResult<Operation> {
        let response = self.send(self.http.delete(url), resource).await?;
        Ok(response.json().await?)
    }

    async fn list_names(
        &self,
        url: &str,
        filter: Option<String>,
        resource: &str,
    ) -> ComputeResult<Vec<String>> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(filter) = &filter {
                query.push(("filter", filter.clone()));
            }
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self.send(self.http.get(url).query(&query), resource).await?;
            let page: ListPage = response.json().await?;
            names.extend(page.items.into_iter().map(|i| i.name));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(names)
    }

    /// Expands short machine/accelerator type names into zone-relative resource paths.
    fn wire_vm_spec(&self, zone: &str, spec: &VmSpec) -> VmSpec {
        let mut wire = spec.clone();
        if !wire.machine_type.contains('/') {
            wire.machine_type = format!("zones/{zone}/machineTypes/{}", wire.machine_type);
        }
        for accelerator in &mut wire.guest_accelerators {
            if !accelerator.accelerator_type.contains('/') {
                accelerator.accelerator_type = format!(
                    "projects/{}/zones/{zone}/acceleratorTypes/{}",
                    self.project, accelerator.accelerator_type
                );
            }
        }
        for interface in &mut wire.network_interfaces {
            if interface.network.is_none() {
                interface.network = Some(DEFAULT_NETWORK.to_string());
            }
        }
        wire
    }
}

#[async_trait]
impl ComputeApi for GcpComputeApi {
    async fn disk_exists(&self, zone: &str, disk: &str) -> ComputeResult<bool> {
        match self.get_disk(zone, disk).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn get_disk(&self, zone: &str, disk: &str) -> ComputeResult<DiskMetadata> {
        let url = self.zone_url(zone, &format!("disks/{disk}"));
        self.get_json(&url, &format!("disk {zone}/{disk}")).await
    }

    async fn insert_disk(
        &self,
        zone: &str,
        disk: &str,
        spec: &DiskSpec,
    ) -> ComputeResult<Operation> {
        let url = self.zone_url(zone, "disks");
        let body = Named {
            name: disk,
            body: spec,
        };
        self.post_op(&url, Some(&body), &format!("disk {zone}/{disk}")).await
    }

    async fn delete_disk(&self, zone: &str, disk: &str) -> ComputeResult<Operation> {
        let url = self.zone_url(zone, &format!("disks/{disk}"));
        self.delete_op(&url, &format!("disk {zone}/{disk}")).await
    }

    async fn create_snapshot(
        &self,
        zone: &str,
        disk: &str,
        snapshot: &str,
        spec: &SnapshotSpec,
    ) -> ComputeResult<Operation> {
        let url = self.zone_url(zone, &format!("disks/{disk}/createSnapshot"));
        let body = Named {
            name: snapshot,
            body: spec,
        };
        self.post_op(&url, Some(&body), &format!("disk {zone}/{disk}")).await
    }

    async fn list_snapshots(&self, filter: &SnapshotFilter) -> ComputeResult<Vec<String>> {
        let url = self.global_url("snapshots");
        self.list_names(&url, Some(filter.render()), "snapshots").await
    }

    async fn get_snapshot(&self, snapshot: &str) -> ComputeResult<SnapshotMetadata> {
        let url = self.global_url(&format!("snapshots/{snapshot}"));
        self.get_json(&url, &format!("snapshot {snapshot}")).await
    }

    async fn delete_snapshot(&self, snapshot: &str) -> ComputeResult<Operation> {
        let url = self.global_url(&format!("snapshots/{snapshot}"));
        self.delete_op(&url, &format!("snapshot {snapshot}")).await
    }

    async fn list_vms(&self, zone: &str) -> ComputeResult<Vec<String>> {
        let url = self.zone_url(zone, "instances");
        self.list_names(&url, None, &format!("instances in {zone}")).await
    }

    async fn get_vm(&self, zone: &str, vm: &str) -> ComputeResult<VmMetadata> {
        let url = self.zone_url(zone, &format!("instances/{vm}"));
        self.get_json(&url, &format!("instance {zone}/{vm}")).await
    }

    async fn insert_vm(&self, zone: &str, vm: &str, spec: &VmSpec) -> ComputeResult<Operation> {
        let url = self.zone_url(zone, "instances");
        let wire = self.wire_vm_spec(zone, spec);
        let body = Named {
            name: vm,
            body: &wire,
        };
        self.post_op(&url, Some(&body), &format!("instance {zone}/{vm}")).await
    }

    async fn start_vm(&self, zone: &str, vm: &str) -> ComputeResult<Operation> {
        let url = self.zone_url(zone, &format!("instances/{vm}/start"));
        self.post_op::<()>(&url, None, &format!("instance {zone}/{vm}")).await
    }

    async fn stop_vm(&self, zone: &str, vm: &str) -> ComputeResult<Operation> {
        let url = self.zone_url(zone, &format!("instances/{vm}/stop"));
        self.post_op::<()>(&url, None, &format!("instance {zone}/{vm}")).await
    }

    async fn delete_vm(&self, zone: &str, vm: &str) -> ComputeResult<Operation> {
        let url = self.zone_url(zone, &format!("instances/{vm}"));
        self.delete_op(&url, &format!("instance {zone}/{vm}")).await
    }

    async fn wait_operation(&self, operation: &Operation) -> ComputeResult<()> {
        let mut current = operation.clone();
        loop {
            if current.is_done() {
                return match current.error_message() {
                    Some(message) => Err(ComputeError::OperationFailed {
                        operation: current.name,
                        message,
                    }),
                    None => Ok(()),
                };
            }

            tokio::time::sleep(OPERATION_POLL_INTERVAL).await;
            current = self
                .get_json(&operation.self_link, &format!("operation {}", operation.name))
                .await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::model::{AcceleratorConfig, NetworkInterface, Scheduling, Tags};

    fn api() -> GcpComputeApi {
        GcpComputeApi::new("https://tmp", "proj", GcloudAuth::new(None))
    }

    #[test]
    fn test_urls() {
        let api = api();
        assert_eq!(
            api.zone_url("us-west1-b", "disks/d"),
            "https://tmp/projects/proj/zones/us-west1-b/disks/d"
        );
        assert_eq!(
            api.global_url("snapshots"),
            "https://tmp/projects/proj/global/snapshots"
        );
    }

    #[test]
    fn test_wire_vm_spec_expands_short_names() {
        let spec = VmSpec {
            machine_type: "custom-4-4096".to_string(),
            disks: vec![],
            guest_accelerators: vec![AcceleratorConfig {
                accelerator_type: "nvidia-tesla-k80".to_string(),
                accelerator_count: 1,
            }],
            network_interfaces: vec![NetworkInterface::default()],
            scheduling: Scheduling {
                automatic_restart: false,
                on_host_maintenance: "TERMINATE".to_string(),
                preemptible: true,
            },
            tags: Tags::default(),
        };

        let wire = api().wire_vm_spec("zone-a", &spec);
        assert_eq!(wire.machine_type, "zones/zone-a/machineTypes/custom-4-4096");
        assert_eq!(
            wire.guest_accelerators[0].accelerator_type,
            "projects/proj/zones/zone-a/acceleratorTypes/nvidia-tesla-k80"
        );
        assert_eq!(
            wire.network_interfaces[0].network.as_deref(),
            Some(DEFAULT_NETWORK)
        );
    }

    #[test]
    fn test_named_body_flattens_spec() {
        let spec = DiskSpec {
            size_gb: 128,
            source_snapshot: "link".to_string(),
            disk_type: "type-url".to_string(),
        };
        let body = serde_json::to_value(Named {
            name: "disk",
            body: &spec,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "name": "disk",
                "sizeGb": "128",
                "sourceSnapshot": "link",
                "type": "type-url"
            })
        );
    }

    #[test]
    fn test_cached_token_ages_out() {
        let fetched_at = Instant::now();
        let token = CachedToken {
            value: "t".to_string(),
            fetched_at,
        };
        assert_eq!(token.fresh(fetched_at), Some("t"));
        assert_eq!(token.fresh(fetched_at + TOKEN_TTL - Duration::from_secs(1)), Some("t"));
        assert_eq!(token.fresh(fetched_at + TOKEN_TTL), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_access_token_refetched_after_invalidate() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("gcloud");
        std::fs::write(
            &script,
            "#!/bin/sh\necho x >> \"$0.calls\"\necho \"token-$(wc -l < \"$0.calls\" | tr -d ' ')\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let auth = GcloudAuth {
            gcloud_path: script,
            credentials: None,
            token: Mutex::new(None),
        };

        assert_eq!(auth.access_token().await.unwrap(), "token-1");
        assert_eq!(auth.access_token().await.unwrap(), "token-1");
        auth.invalidate().await;
        assert_eq!(auth.access_token().await.unwrap(), "token-2");
    }

    #[tokio::test]
    async fn test_resolve_project_prefers_explicit() {
        let auth = GcloudAuth::new(None);
        let project = resolve_project(Some("explicit".to_string()), &auth).await.unwrap();
        assert_eq!(project, "explicit");
    }

    #[tokio::test]
    async fn test_resolve_project_from_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        tokio::fs::write(&path, r#"{"type":"service_account","project_id":"from-key"}"#)
            .await
            .unwrap();

        let auth = GcloudAuth::new(Some(path));
        let project = resolve_project(None, &auth).await.unwrap();
        assert_eq!(project, "from-key");
    }
}
