//! Domain lifecycle and access checks.

use super::GeoStore;
use super::keys::{self, DOMAIN_PARTITION, Model};
use super::versioned::{create_unique, update_versioned};
use crate::compute::validation::{validate_domain_id, validate_domain_name, validate_zoom};
use crate::error::{GeoTileError, Result};
use crate::storage::{SortRange, Store, UpdateExpr};
use chrono::Utc;
use geotile_types::{Domain, DomainUpdate, NewDomain};
use std::collections::BTreeSet;

impl<S: Store> GeoStore<S> {
    /// Create a domain owned by `user`.
    ///
    /// Zoom and owners are fixed here; no later operation changes them.
    pub fn create_domain(&self, user: &str, domain_id: &str, request: NewDomain) -> Result<Domain> {
        validate_domain_id(domain_id)?;
        validate_domain_name(&request.name)?;
        validate_zoom(request.zoom)?;
        validate_ttl(request.ttl)?;

        let domain = Domain {
            domain_id: domain_id.to_string(),
            name: request.name,
            zoom: request.zoom,
            access: request.access,
            ttl: request.ttl,
            owners: BTreeSet::from([user.to_string()]),
            version: 1,
            item_count: 0,
            index_size: 0,
            created: Utc::now(),
        };

        let doc = keys::to_document(&domain, &keys::domain_key(domain_id), Model::Domain)?;
        create_unique(self.store.as_ref(), doc, &format!("Domain {}", domain_id))?;

        log::info!(
            "Created domain {} (zoom {}, {}) for {}",
            domain_id,
            domain.zoom,
            domain.access,
            user
        );
        Ok(domain)
    }

    /// Read a domain. Private domains are visible to their owners only.
    pub fn get_domain(&self, user: Option<&str>, domain_id: &str) -> Result<Domain> {
        self.readable_domain(user, domain_id)
    }

    /// Change a domain's name, access or ttl. `request.version` must match.
    pub fn update_domain(
        &self,
        user: &str,
        domain_id: &str,
        request: DomainUpdate,
    ) -> Result<Domain> {
        validate_domain_id(domain_id)?;

        let mut update = UpdateExpr::new();
        if let Some(name) = request.name {
            validate_domain_name(&name)?;
            update = update.set("name", name);
        }
        if let Some(access) = request.access {
            update = update.set("access", access.as_str());
        }
        if let Some(ttl) = request.ttl {
            validate_ttl(ttl)?;
            update = update.set("ttl", ttl);
        }

        let doc = update_versioned(
            self.store.as_ref(),
            &keys::domain_key(domain_id),
            request.version,
            update,
            Some(user),
            &format!("Domain {}", domain_id),
        )?;
        keys::from_document(doc)
    }

    /// Public domains plus the private ones `user` owns.
    pub fn list_domains(&self, user: Option<&str>) -> Result<Vec<Domain>> {
        let docs = self.store.query_partition(DOMAIN_PARTITION, &SortRange::All)?;
        let mut domains = Vec::with_capacity(docs.len());
        for doc in docs {
            let domain: Domain = keys::from_document(doc)?;
            if domain.is_readable_by(user) {
                domains.push(domain);
            }
        }
        Ok(domains)
    }

    pub(crate) fn load_domain(&self, domain_id: &str) -> Result<Domain> {
        validate_domain_id(domain_id)?;
        match self.store.get(&keys::domain_key(domain_id))? {
            Some(doc) => keys::from_document(doc),
            None => Err(GeoTileError::NotFound(format!(
                "Domain {} not found",
                domain_id
            ))),
        }
    }

    pub(crate) fn readable_domain(&self, user: Option<&str>, domain_id: &str) -> Result<Domain> {
        let domain = self.load_domain(domain_id)?;
        if !domain.is_readable_by(user) {
            return Err(GeoTileError::Forbidden(format!(
                "Domain {} is private",
                domain_id
            )));
        }
        Ok(domain)
    }

    pub(crate) fn owned_domain(&self, user: &str, domain_id: &str) -> Result<Domain> {
        let domain = self.load_domain(domain_id)?;
        if !domain.is_owner(user) {
            return Err(GeoTileError::Forbidden(format!(
                "{} is not an owner of domain {}",
                user, domain_id
            )));
        }
        Ok(domain)
    }
}

fn validate_ttl(ttl: i64) -> Result<()> {
    if ttl < 0 {
        return Err(GeoTileError::InvalidInput(format!(
            "ttl must not be negative, got: {}",
            ttl
        )));
    }
    Ok(())
}
