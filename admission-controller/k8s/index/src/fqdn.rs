use ahash::AHashMap as HashMap;
use lb_admission_core::ResourceId;
use parking_lot::RwLock;

/// Tracks which HostRule owns each FQDN and alias in the cluster.
///
/// A name may be owned by at most one HostRule, whether it is claimed as a
/// primary FQDN or as an alias. Conflict checks and claims are symmetric: an
/// alias may not shadow another rule's FQDN and an FQDN may not shadow
/// another rule's alias.
#[derive(Debug, Default)]
pub struct FqdnIndex {
    inner: RwLock<Inner>,
}

/// The names a single HostRule holds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Claim {
    pub fqdn: String,
    pub aliases: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    #[error("duplicate fqdn {fqdn} found in {owner}")]
    Fqdn { fqdn: String, owner: ResourceId },

    #[error("{alias} is already in use by hostrule {owner}")]
    Alias { alias: String, owner: ResourceId },
}

#[derive(Debug, Default)]
struct Inner {
    fqdns: HashMap<String, ResourceId>,
    aliases: HashMap<String, ResourceId>,
    claims: HashMap<ResourceId, Claim>,
}

// === impl FqdnIndex ===

impl FqdnIndex {
    /// Fails if `fqdn` is held by a HostRule other than `owner`.
    pub fn check_fqdn(&self, owner: &ResourceId, fqdn: &str) -> Result<(), Conflict> {
        self.inner.read().check_fqdn(owner, fqdn)
    }

    /// Fails on the first alias held by a HostRule other than `owner`.
    pub fn check_aliases(&self, owner: &ResourceId, aliases: &[String]) -> Result<(), Conflict> {
        self.inner.read().check_aliases(owner, aliases)
    }

    /// Atomically replaces `owner`'s claim with `claim`.
    ///
    /// Conflicts are re-checked under the write lock so that concurrent
    /// admissions cannot both claim a name. On conflict the previous claim
    /// is left in place.
    pub fn claim(&self, owner: &ResourceId, claim: Claim) -> Result<(), Conflict> {
        let mut inner = self.inner.write();
        inner.check_fqdn(owner, &claim.fqdn)?;
        inner.check_aliases(owner, &claim.aliases)?;

        inner.remove(owner);
        if !claim.fqdn.is_empty() {
            inner.fqdns.insert(claim.fqdn.clone(), owner.clone());
        }
        for alias in &claim.aliases {
            inner.aliases.insert(alias.clone(), owner.clone());
        }
        tracing::trace!(%owner, fqdn = %claim.fqdn, aliases = claim.aliases.len(), "Claimed");
        inner.claims.insert(owner.clone(), claim);
        Ok(())
    }

    /// Drops every name held by `owner`.
    pub fn release(&self, owner: &ResourceId) -> Option<Claim> {
        self.inner.write().remove(owner)
    }

    pub fn claim_of(&self, owner: &ResourceId) -> Option<Claim> {
        self.inner.read().claims.get(owner).cloned()
    }

    pub fn owner_of(&self, name: &str) -> Option<ResourceId> {
        let inner = self.inner.read();
        inner
            .fqdns
            .get(name)
            .or_else(|| inner.aliases.get(name))
            .cloned()
    }

    pub fn fqdn_count(&self) -> usize {
        self.inner.read().fqdns.len()
    }

    pub fn alias_count(&self) -> usize {
        self.inner.read().aliases.len()
    }
}

// === impl Inner ===

impl Inner {
    fn check_fqdn(&self, owner: &ResourceId, fqdn: &str) -> Result<(), Conflict> {
        if fqdn.is_empty() {
            return Ok(());
        }
        match self.held_by_other(owner, fqdn) {
            Some(other) => Err(Conflict::Fqdn {
                fqdn: fqdn.to_string(),
                owner: other.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_aliases(&self, owner: &ResourceId, aliases: &[String]) -> Result<(), Conflict> {
        for alias in aliases {
            if let Some(other) = self.held_by_other(owner, alias) {
                return Err(Conflict::Alias {
                    alias: alias.clone(),
                    owner: other.clone(),
                });
            }
        }
        Ok(())
    }

    fn held_by_other(&self, owner: &ResourceId, name: &str) -> Option<&ResourceId> {
        self.fqdns
            .get(name)
            .filter(|o| *o != owner)
            .or_else(|| self.aliases.get(name).filter(|o| *o != owner))
    }

    fn remove(&mut self, owner: &ResourceId) -> Option<Claim> {
        let claim = self.claims.remove(owner)?;
        if self.fqdns.get(&claim.fqdn) == Some(owner) {
            self.fqdns.remove(&claim.fqdn);
        }
        for alias in &claim.aliases {
            if self.aliases.get(alias) == Some(owner) {
                self.aliases.remove(alias);
            }
        }
        Some(claim)
    }
}
