//! Kubernetes-backed cluster service
//!
//! Custom resources are accessed through dynamic APIs built from the resource
//! type table, so no generated CRD types are required.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Client;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, PostParams};
use kube::config::{Config, KubeConfigOptions};
use schemasync_core::ResourceType;
use std::collections::BTreeMap;

use crate::cluster::ClusterService;
use crate::error::{KubeError, Result};
use crate::labels::{FIELD_MANAGER, managed_labels};
use crate::resources::{CustomResource, ManagedResource, ResourceRef, api_resource};

/// Cluster service talking to a Kubernetes API server
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Connect using the default kubeconfig or in-cluster configuration
    pub async fn new() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    /// Connect using a specific kubeconfig context (default when `None`)
    pub async fn with_context(context: Option<&str>) -> Result<Self> {
        match context {
            None => Self::new().await,
            Some(context) => {
                let options = KubeConfigOptions {
                    context: Some(context.to_string()),
                    ..Default::default()
                };
                let config = Config::from_kubeconfig(&options).await?;
                let client = Client::try_from(config)?;
                Ok(Self { client })
            }
        }
    }

    /// Create with an existing Kubernetes client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Get the underlying Kubernetes client
    pub fn kube_client(&self) -> &Client {
        &self.client
    }

    fn api(&self, namespace: &str, kind: ResourceType) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &api_resource(kind))
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ClusterService for KubeCluster {
    async fn ensure_namespace(&self, namespace: &str) -> Result<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        if api.get_opt(namespace).await?.is_some() {
            return Ok(());
        }

        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some(namespace.to_string()),
                labels: Some(managed_labels()),
                ..Default::default()
            },
            ..Default::default()
        };

        match api.create(&Self::post_params(), &ns).await {
            Ok(_) => {
                tracing::info!(namespace, "created namespace");
                Ok(())
            }
            // Created concurrently by someone else
            Err(kube::Error::Api(e)) if e.code == 409 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_resources(
        &self,
        namespace: &str,
        kind: ResourceType,
    ) -> Result<BTreeMap<String, ManagedResource>> {
        let list = self.api(namespace, kind).list(&ListParams::default()).await?;

        let mut resources = BTreeMap::new();
        for obj in &list.items {
            let resource = ManagedResource::from_dynamic(kind, obj)?;
            resources.insert(resource.name.clone(), resource);
        }
        Ok(resources)
    }

    async fn create(&self, namespace: &str, resource: &CustomResource) -> Result<()> {
        let mut obj = resource.to_dynamic_object();
        obj.metadata.namespace = Some(namespace.to_string());
        self.api(namespace, resource.kind)
            .create(&Self::post_params(), &obj)
            .await?;
        Ok(())
    }

    async fn replace(&self, namespace: &str, resource: &CustomResource) -> Result<()> {
        let api = self.api(namespace, resource.kind);
        let current = api.get(resource.name()).await?;

        let mut obj = resource.to_dynamic_object();
        obj.metadata.namespace = Some(namespace.to_string());
        obj.metadata.resource_version = current.metadata.resource_version;

        api.replace(resource.name(), &Self::post_params(), &obj)
            .await?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, resource: &ResourceRef) -> Result<()> {
        match self
            .api(namespace, resource.kind)
            .delete(&resource.name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 404 => {
                tracing::debug!(namespace, resource = %resource, "already deleted");
                Ok(())
            }
            Err(e) => Err(KubeError::Api(e)),
        }
    }
}
