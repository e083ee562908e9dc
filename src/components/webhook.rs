// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pieces shared by the validating and mutating webhook configurations

use k8s_openapi::api::admissionregistration::v1::{
    RuleWithOperations, ServiceReference, WebhookClientConfig,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use k8s_openapi::ByteString;
use std::collections::{BTreeMap, BTreeSet};

use super::enforcer_deployment::EnforcerDeployment;
use crate::constants::enforcer;
use crate::types::CBContainersAgentSpec;

pub const MATCH_POLICY_EQUIVALENT: &str = "Equivalent";
pub const SIDE_EFFECTS_NONE: &str = "None";
pub const SIDE_EFFECTS_NONE_ON_DRY_RUN: &str = "NoneOnDryRun";
pub const ADMISSION_REVIEW_VERSION: &str = "v1beta1";

/// Enforcer labels, plus the label exempting the configuration from its own admission
pub fn webhook_labels(agent: &CBContainersAgentSpec) -> BTreeMap<String, String> {
    let mut labels = EnforcerDeployment::labels(agent);
    labels.insert(enforcer::DISABLED_LABEL_KEY.to_string(), "true".to_string());
    labels
}

/// Skip namespaces opted out through the ignore label and the listed namespaces
pub fn namespace_selector(excluded_namespaces: &[&str]) -> LabelSelector {
    LabelSelector {
        match_expressions: Some(vec![
            LabelSelectorRequirement {
                key: enforcer::IGNORE_LABEL_KEY.to_string(),
                operator: "NotIn".to_string(),
                values: Some(vec![enforcer::IGNORE_LABEL_VALUE.to_string()]),
            },
            LabelSelectorRequirement {
                key: enforcer::NAMESPACE_NAME_LABEL_KEY.to_string(),
                operator: "NotIn".to_string(),
                values: Some(excluded_namespaces.iter().map(|ns| ns.to_string()).collect()),
            },
        ]),
        ..Default::default()
    }
}

/// Route admission reviews to the enforcer Service
pub fn client_config(namespace: &str, path: &str, ca_bundle: &[u8]) -> WebhookClientConfig {
    WebhookClientConfig {
        ca_bundle: Some(ByteString(ca_bundle.to_vec())),
        service: Some(ServiceReference {
            name: enforcer::NAME.to_string(),
            namespace: namespace.to_string(),
            path: Some(path.to_string()),
            port: Some(enforcer::SERVICE_PORT),
        }),
        url: None,
    }
}

/// A rule over every group and version
pub fn rule(operations: &[&str], resources: &[&str]) -> RuleWithOperations {
    let to_vec = |values: &[&str]| Some(values.iter().map(|v| v.to_string()).collect());
    RuleWithOperations {
        api_groups: to_vec(&["*"]),
        api_versions: to_vec(&["*"]),
        operations: to_vec(operations),
        resources: to_vec(resources),
        ..Default::default()
    }
}

fn as_set(values: &Option<Vec<String>>) -> BTreeSet<&str> {
    values.iter().flatten().map(String::as_str).collect()
}

fn same_rule(existing: &RuleWithOperations, desired: &RuleWithOperations) -> bool {
    as_set(&existing.api_groups) == as_set(&desired.api_groups)
        && as_set(&existing.api_versions) == as_set(&desired.api_versions)
        && as_set(&existing.operations) == as_set(&desired.operations)
        && as_set(&existing.resources) == as_set(&desired.resources)
}

/// Replace the rules unless they already hold exactly `desired`, compared as sets
pub fn mutate_rules(rules: &mut Option<Vec<RuleWithOperations>>, desired: RuleWithOperations) {
    let unchanged = matches!(rules.as_deref(), Some([existing]) if same_rule(existing, &desired));
    if !unchanged {
        *rules = Some(vec![desired]);
    }
}

/// Find the item called `name`, appending one built by `make` when missing
pub fn upsert_named<'a, T>(
    items: &'a mut Vec<T>,
    name: &str,
    name_of: fn(&T) -> &str,
    make: impl FnOnce() -> T,
) -> &'a mut T {
    let index = match items.iter().position(|item| name_of(item) == name) {
        Some(index) => index,
        None => {
            items.push(make());
            items.len() - 1
        }
    };
    &mut items[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_compared_as_sets() {
        let mut rules = Some(vec![rule(&["*"], &["pods", "services"])]);
        let before = rules.clone();

        mutate_rules(&mut rules, rule(&["*"], &["services", "pods"]));

        assert_eq!(rules, before);
    }

    #[test]
    fn test_rules_replaced_on_difference() {
        let mut rules = Some(vec![rule(&["*"], &["pods"])]);

        mutate_rules(&mut rules, rule(&["*"], &["pods", "services"]));

        assert_eq!(rules.unwrap()[0].resources.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_namespace_selector_excludes() {
        let selector = namespace_selector(&["dp", "kube-system"]);

        let expressions = selector.match_expressions.unwrap();
        assert_eq!(expressions[0].key, "octarine");
        assert_eq!(expressions[1].key, "kubernetes.io/metadata.name");
        assert_eq!(expressions[1].values.as_ref().unwrap(), &vec!["dp", "kube-system"]);
    }
}
