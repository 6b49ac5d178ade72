//! Reqwest-backed client for the Polaris management API

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::ManagementApi;
use super::error::ApiError;
use super::models::*;

const MANAGEMENT_API_PREFIX: &str = "api/management/v1";

/// Client for one Polaris instance. Cheap to clone; the underlying reqwest
/// client pools connections.
#[derive(Debug, Clone)]
pub struct PolarisClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl PolarisClient {
    /// Build a client for the instance at `base_url`, authenticating every
    /// request with the given bearer token. All calls share one deadline so
    /// a hung instance cannot stall a migration run forever.
    pub fn new(base_url: &str, token: String, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = format!("{}/{}", self.base_url, MANAGEMENT_API_PREFIX);
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), message))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        debug!("GET {}", url);
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn post_json<B: Serialize>(&self, url: String, body: &B) -> Result<(), ApiError> {
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn post_json_response<B: Serialize, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ApiError> {
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn put_json<B: Serialize>(&self, url: String, body: &B) -> Result<(), ApiError> {
        debug!("PUT {}", url);
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, url: String) -> Result<(), ApiError> {
        debug!("DELETE {}", url);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ManagementApi for PolarisClient {
    async fn list_catalogs(&self) -> Result<Vec<Catalog>, ApiError> {
        let listing: Catalogs = self.get_json(self.url(&["catalogs"])).await?;
        Ok(listing.catalogs)
    }

    async fn create_catalog(&self, catalog: &Catalog) -> Result<(), ApiError> {
        let request = CreateCatalogRequest {
            catalog: catalog.clone(),
        };
        self.post_json(self.url(&["catalogs"]), &request).await
    }

    async fn delete_catalog(&self, catalog_name: &str) -> Result<(), ApiError> {
        self.delete(self.url(&["catalogs", catalog_name])).await
    }

    async fn list_catalog_roles(&self, catalog_name: &str) -> Result<Vec<CatalogRole>, ApiError> {
        let listing: CatalogRoles = self
            .get_json(self.url(&["catalogs", catalog_name, "catalog-roles"]))
            .await?;
        Ok(listing.roles)
    }

    async fn create_catalog_role(
        &self,
        catalog_name: &str,
        role: &CatalogRole,
    ) -> Result<(), ApiError> {
        let request = CreateCatalogRoleRequest {
            catalog_role: role.clone(),
        };
        self.post_json(self.url(&["catalogs", catalog_name, "catalog-roles"]), &request)
            .await
    }

    async fn delete_catalog_role(
        &self,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError> {
        self.delete(self.url(&["catalogs", catalog_name, "catalog-roles", role_name]))
            .await
    }

    async fn list_grants(
        &self,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<Vec<GrantResource>, ApiError> {
        let listing: GrantResources = self
            .get_json(self.url(&["catalogs", catalog_name, "catalog-roles", role_name, "grants"]))
            .await?;
        Ok(listing.grants)
    }

    async fn add_grant(
        &self,
        catalog_name: &str,
        role_name: &str,
        grant: &GrantResource,
    ) -> Result<(), ApiError> {
        let request = AddGrantRequest {
            grant: grant.clone(),
        };
        self.put_json(
            self.url(&["catalogs", catalog_name, "catalog-roles", role_name, "grants"]),
            &request,
        )
        .await
    }

    async fn revoke_grant(
        &self,
        catalog_name: &str,
        role_name: &str,
        grant: &GrantResource,
    ) -> Result<(), ApiError> {
        let request = RevokeGrantRequest {
            grant: grant.clone(),
        };
        let url = format!(
            "{}?cascade=false",
            self.url(&["catalogs", catalog_name, "catalog-roles", role_name, "grants"])
        );
        self.post_json(url, &request).await
    }

    async fn list_assignee_principal_roles(
        &self,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<Vec<PrincipalRole>, ApiError> {
        let listing: PrincipalRoles = self
            .get_json(self.url(&[
                "catalogs",
                catalog_name,
                "catalog-roles",
                role_name,
                "principal-roles",
            ]))
            .await?;
        Ok(listing.roles)
    }

    async fn assign_catalog_role(
        &self,
        principal_role_name: &str,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError> {
        let request = GrantCatalogRoleRequest {
            catalog_role: CatalogRole::new(role_name),
        };
        self.put_json(
            self.url(&["principal-roles", principal_role_name, "catalog-roles", catalog_name]),
            &request,
        )
        .await
    }

    async fn revoke_catalog_role(
        &self,
        principal_role_name: &str,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError> {
        self.delete(self.url(&[
            "principal-roles",
            principal_role_name,
            "catalog-roles",
            catalog_name,
            role_name,
        ]))
        .await
    }

    async fn list_principals(&self) -> Result<Vec<Principal>, ApiError> {
        let listing: Principals = self.get_json(self.url(&["principals"])).await?;
        Ok(listing.principals)
    }

    async fn create_principal(
        &self,
        principal: &Principal,
    ) -> Result<PrincipalWithCredentials, ApiError> {
        let request = CreatePrincipalRequest {
            principal: principal.clone(),
        };
        self.post_json_response(self.url(&["principals"]), &request)
            .await
    }

    async fn delete_principal(&self, principal_name: &str) -> Result<(), ApiError> {
        self.delete(self.url(&["principals", principal_name])).await
    }

    async fn list_principal_roles(&self) -> Result<Vec<PrincipalRole>, ApiError> {
        let listing: PrincipalRoles = self.get_json(self.url(&["principal-roles"])).await?;
        Ok(listing.roles)
    }

    async fn create_principal_role(&self, role: &PrincipalRole) -> Result<(), ApiError> {
        let request = CreatePrincipalRoleRequest {
            principal_role: role.clone(),
        };
        self.post_json(self.url(&["principal-roles"]), &request).await
    }

    async fn delete_principal_role(&self, role_name: &str) -> Result<(), ApiError> {
        self.delete(self.url(&["principal-roles", role_name])).await
    }

    async fn list_principal_roles_assigned(
        &self,
        principal_name: &str,
    ) -> Result<Vec<PrincipalRole>, ApiError> {
        let listing: PrincipalRoles = self
            .get_json(self.url(&["principals", principal_name, "principal-roles"]))
            .await?;
        Ok(listing.roles)
    }

    async fn assign_principal_role(
        &self,
        principal_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError> {
        let request = GrantPrincipalRoleRequest {
            principal_role: PrincipalRole::new(role_name),
        };
        self.put_json(
            self.url(&["principals", principal_name, "principal-roles"]),
            &request,
        )
        .await
    }

    async fn revoke_principal_role(
        &self,
        principal_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError> {
        self.delete(self.url(&["principals", principal_name, "principal-roles", role_name]))
            .await
    }
}
