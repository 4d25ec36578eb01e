//! Internal descriptor storage.

use std::collections::HashMap;

use crate::descriptor::ServiceDescriptor;
use crate::lifetime::Lifetime;
use crate::token::{ServiceKey, Token};

/// Descriptor storage: per-token ordered sequences plus a keyed index.
///
/// Registration order is preserved; the most-recently-added descriptor wins
/// ordinary resolution, but nothing is ever discarded by a later
/// registration, so resolve-all sees one entry per descriptor.
#[derive(Clone, Default)]
pub(crate) struct Registry {
    entries: HashMap<Token, Vec<ServiceDescriptor>>,
    /// First-appearance order of tokens, for deterministic iteration.
    order: Vec<Token>,
    /// `(secondary key, token)` to descriptor index within the token's
    /// sequence. Last keyed registration wins for a duplicate pair.
    keyed: HashMap<(ServiceKey, Token), usize>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor to its token's sequence.
    pub(crate) fn append(&mut self, descriptor: ServiceDescriptor) {
        let token = descriptor.token.clone();
        let seq = self.entries.entry(token.clone()).or_insert_with(|| {
            self.order.push(token.clone());
            Vec::new()
        });
        if let Some(key) = descriptor.service_key.clone() {
            self.keyed.insert((key, token), seq.len());
        }
        seq.push(descriptor);
    }

    /// Appends only when the token has no descriptor yet. Returns whether the
    /// descriptor was taken.
    pub(crate) fn try_append(&mut self, descriptor: ServiceDescriptor) -> bool {
        if self.contains(&descriptor.token) {
            return false;
        }
        self.append(descriptor);
        true
    }

    /// Drops every descriptor for the token. Returns whether anything was
    /// removed.
    pub(crate) fn remove(&mut self, token: &Token) -> bool {
        if self.entries.remove(token).is_none() {
            return false;
        }
        self.order.retain(|t| t != token);
        self.keyed.retain(|(_, t), _| t != token);
        true
    }

    /// Removes then re-registers, carrying over the prior last descriptor's
    /// lifetime (Singleton when none existed).
    pub(crate) fn replace(&mut self, mut descriptor: ServiceDescriptor) {
        descriptor.lifetime = self
            .last(&descriptor.token)
            .map(|(_, d)| d.lifetime)
            .unwrap_or(Lifetime::Singleton);
        self.remove(&descriptor.token);
        self.append(descriptor);
    }

    pub(crate) fn contains(&self, token: &Token) -> bool {
        self.entries.contains_key(token)
    }

    pub(crate) fn descriptors(&self, token: &Token) -> &[ServiceDescriptor] {
        self.entries.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The winning descriptor for ordinary resolution, with its index.
    pub(crate) fn last(&self, token: &Token) -> Option<(usize, &ServiceDescriptor)> {
        let seq = self.entries.get(token)?;
        let index = seq.len().checked_sub(1)?;
        Some((index, &seq[index]))
    }

    pub(crate) fn keyed_index(&self, key: &ServiceKey, token: &Token) -> Option<usize> {
        self.keyed.get(&(key.clone(), token.clone())).copied()
    }

    /// Tokens in first-appearance order.
    pub(crate) fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.order.iter()
    }

    /// Every descriptor, in token first-appearance order then registration
    /// order within the token.
    pub(crate) fn iter_all(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.order
            .iter()
            .flat_map(move |token| self.descriptors(token).iter())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
