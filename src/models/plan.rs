//! Query execution plan model.
//!
//! This module defines:
//! - `QueryPlan` / `PlanNode`: the tree PostgreSQL returns for `EXPLAIN (FORMAT JSON)`
//! - `Modifications`: user edits applied to a copy of a plan (what-if questions)
//! - `PlanTree`: a flattened, front-end friendly view of a plan
//! - `to_dot`: Graphviz DOT rendering of a plan
//!
//! Keys keep PostgreSQL's names on the wire (`"Node Type"`, `"Total Cost"`, ...).
//! Keys without a typed field are preserved in `extra` so a plan serialises
//! back with everything the server reported.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Plan returned by `EXPLAIN (FORMAT JSON)`.
///
/// # JSON Example
///
/// ```json
/// {
///   "Plan": { "Node Type": "Seq Scan", "Relation Name": "orders", "Total Cost": 4105.0, ... },
///   "Planning Time": 0.11
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    #[serde(rename = "Plan")]
    pub plan: PlanNode,

    #[serde(
        rename = "Planning Time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub planning_time: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One operator in a plan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNode {
    #[serde(rename = "Node Type")]
    pub node_type: String,

    #[serde(
        rename = "Parent Relationship",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_relationship: Option<String>,

    #[serde(rename = "Join Type", default, skip_serializing_if = "Option::is_none")]
    pub join_type: Option<String>,

    #[serde(rename = "Strategy", default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    #[serde(
        rename = "Relation Name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub relation_name: Option<String>,

    #[serde(rename = "Schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(rename = "Alias", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(rename = "Index Name", default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    #[serde(rename = "Startup Cost", default)]
    pub startup_cost: f64,

    #[serde(rename = "Total Cost")]
    pub total_cost: f64,

    #[serde(rename = "Plan Rows", default, skip_serializing_if = "Option::is_none")]
    pub plan_rows: Option<f64>,

    #[serde(rename = "Plan Width", default, skip_serializing_if = "Option::is_none")]
    pub plan_width: Option<i64>,

    #[serde(rename = "Filter", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(rename = "Index Cond", default, skip_serializing_if = "Option::is_none")]
    pub index_cond: Option<String>,

    #[serde(rename = "Hash Cond", default, skip_serializing_if = "Option::is_none")]
    pub hash_cond: Option<String>,

    #[serde(rename = "Merge Cond", default, skip_serializing_if = "Option::is_none")]
    pub merge_cond: Option<String>,

    #[serde(rename = "Join Filter", default, skip_serializing_if = "Option::is_none")]
    pub join_filter: Option<String>,

    #[serde(rename = "Sort Key", default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<Vec<String>>,

    #[serde(rename = "Group Key", default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<Vec<String>>,

    #[serde(rename = "Plans", default, skip_serializing_if = "Vec::is_empty")]
    pub plans: Vec<PlanNode>,

    /// Every other key PostgreSQL reported for this node.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Why a property edit was not applied to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditRejection {
    /// The node does not carry this property.
    NotApplicable,
    /// The property exists but the value has the wrong JSON type.
    WrongType(&'static str),
}

/// Parse the value of the `QUERY PLAN` column of `EXPLAIN (FORMAT JSON)`.
///
/// PostgreSQL returns a one-element array; a bare plan object is accepted too.
pub fn parse_explain_output(value: Value) -> Result<QueryPlan, AppError> {
    let object = match value {
        Value::Array(mut items) => {
            if items.is_empty() {
                return Err(AppError::MalformedPlan(
                    "EXPLAIN returned an empty array".to_string(),
                ));
            }
            items.swap_remove(0)
        }
        object @ Value::Object(_) => object,
        other => {
            return Err(AppError::MalformedPlan(format!(
                "expected a JSON array or object, got {}",
                json_type_name(&other)
            )));
        }
    };

    serde_json::from_value(object).map_err(|e| AppError::MalformedPlan(e.to_string()))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl QueryPlan {
    /// Estimated total cost of the whole plan (the root node's total cost).
    pub fn total_cost(&self) -> f64 {
        self.plan.total_cost
    }
}

/// Pre-order iterator over a plan tree.
pub struct Walk<'a> {
    stack: Vec<&'a PlanNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.plans.iter().rev());
        Some(node)
    }
}

impl PlanNode {
    /// Visit this node and all descendants in pre-order.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    /// Number of nodes per operator, ordered by operator name.
    pub fn operator_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for node in self.walk() {
            *counts.entry(node.node_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Short one-line description in the style of text `EXPLAIN` output.
    ///
    /// e.g. `Index Scan using orders_pkey on orders o`, `Hash Join (Left)`
    pub fn label(&self) -> String {
        let mut label = self.node_type.clone();
        if let Some(join_type) = self.join_type.as_deref() {
            if join_type != "Inner" {
                let _ = write!(label, " ({join_type})");
            }
        }
        if let Some(index) = self.index_name.as_deref() {
            let _ = write!(label, " using {index}");
        }
        if let Some(relation) = self.relation_name.as_deref() {
            let _ = write!(label, " on {relation}");
            if let Some(alias) = self.alias.as_deref().filter(|a| *a != relation) {
                let _ = write!(label, " {alias}");
            }
        }
        label
    }

    /// Set a property by its PostgreSQL key name.
    ///
    /// Optional properties can only be edited on nodes that already carry
    /// them. `Plans` is structural and cannot be edited this way.
    pub fn set_property(&mut self, key: &str, value: &Value) -> Result<(), EditRejection> {
        match key {
            "Node Type" => {
                self.node_type = value
                    .as_str()
                    .ok_or(EditRejection::WrongType("string"))?
                    .to_string();
                Ok(())
            }
            "Startup Cost" => set_number(&mut self.startup_cost, value),
            "Total Cost" => set_number(&mut self.total_cost, value),
            "Parent Relationship" => replace_string(&mut self.parent_relationship, value),
            "Join Type" => replace_string(&mut self.join_type, value),
            "Strategy" => replace_string(&mut self.strategy, value),
            "Relation Name" => replace_string(&mut self.relation_name, value),
            "Schema" => replace_string(&mut self.schema, value),
            "Alias" => replace_string(&mut self.alias, value),
            "Index Name" => replace_string(&mut self.index_name, value),
            "Filter" => replace_string(&mut self.filter, value),
            "Index Cond" => replace_string(&mut self.index_cond, value),
            "Hash Cond" => replace_string(&mut self.hash_cond, value),
            "Merge Cond" => replace_string(&mut self.merge_cond, value),
            "Join Filter" => replace_string(&mut self.join_filter, value),
            "Sort Key" => replace_string_list(&mut self.sort_key, value),
            "Group Key" => replace_string_list(&mut self.group_key, value),
            "Plan Rows" => {
                let slot = self
                    .plan_rows
                    .as_mut()
                    .ok_or(EditRejection::NotApplicable)?;
                set_number(slot, value)
            }
            "Plan Width" => {
                let slot = self
                    .plan_width
                    .as_mut()
                    .ok_or(EditRejection::NotApplicable)?;
                *slot = value.as_i64().ok_or(EditRejection::WrongType("integer"))?;
                Ok(())
            }
            "Plans" => Err(EditRejection::NotApplicable),
            other => match self.extra.get_mut(other) {
                Some(slot) => {
                    *slot = value.clone();
                    Ok(())
                }
                None => Err(EditRejection::NotApplicable),
            },
        }
    }

    fn apply_edits(
        &mut self,
        edits: &[(&str, &Value)],
        target: Option<&str>,
        matched: &mut usize,
        warnings: &mut Vec<String>,
    ) {
        let targeted = target.is_none_or(|t| self.node_type.eq_ignore_ascii_case(t));
        if targeted {
            *matched += 1;
            let original_type = self.node_type.clone();
            for (key, value) in edits {
                if let Err(rejection) = self.set_property(key, value) {
                    let warning = match rejection {
                        EditRejection::NotApplicable => format!(
                            "Modification '{key}' not applicable to node {original_type}"
                        ),
                        EditRejection::WrongType(expected) => format!(
                            "Modification '{key}' on node {original_type} expects a {expected} value"
                        ),
                    };
                    if !warnings.contains(&warning) {
                        tracing::warn!("{}", warning);
                        warnings.push(warning);
                    }
                }
            }
        }

        for child in &mut self.plans {
            child.apply_edits(edits, target, matched, warnings);
        }
    }
}

fn set_number(slot: &mut f64, value: &Value) -> Result<(), EditRejection> {
    *slot = value.as_f64().ok_or(EditRejection::WrongType("number"))?;
    Ok(())
}

fn replace_string(slot: &mut Option<String>, value: &Value) -> Result<(), EditRejection> {
    let current = slot.as_mut().ok_or(EditRejection::NotApplicable)?;
    *current = value
        .as_str()
        .ok_or(EditRejection::WrongType("string"))?
        .to_string();
    Ok(())
}

fn replace_string_list(slot: &mut Option<Vec<String>>, value: &Value) -> Result<(), EditRejection> {
    let current = slot.as_mut().ok_or(EditRejection::NotApplicable)?;
    let items = value
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or(EditRejection::WrongType("array of strings"))?;
    *current = items;
    Ok(())
}

/// User edits to a plan, posed as a what-if question.
///
/// # JSON Example
///
/// ```json
/// {
///   "node_type": "Merge Join",
///   "target_node_type": "Hash Join",
///   "properties": { "Join Type": "Inner" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Modifications {
    /// Desired operator for targeted nodes. Also selects the planner settings
    /// used to obtain the alternative plan.
    #[serde(default)]
    pub node_type: Option<String>,

    /// Only nodes of this operator are edited; all nodes when absent.
    #[serde(default)]
    pub target_node_type: Option<String>,

    /// Arbitrary property edits keyed by PostgreSQL plan key.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Apply modifications to a copy of `plan`.
///
/// Returns the edited copy and a warning for every edit that did not apply.
/// The input plan is left untouched.
pub fn apply_modifications(
    plan: &QueryPlan,
    modifications: &Modifications,
) -> (QueryPlan, Vec<String>) {
    let mut modified = plan.clone();
    let mut warnings = Vec::new();

    let mut edits: Vec<(&str, &Value)> = modifications
        .properties
        .iter()
        .filter(|(key, _)| !(modifications.node_type.is_some() && key.as_str() == "Node Type"))
        .map(|(key, value)| (key.as_str(), value))
        .collect();
    let node_type = modifications.node_type.clone().map(Value::String);
    if let Some(node_type) = node_type.as_ref() {
        edits.push(("Node Type", node_type));
    }

    let target = modifications
        .target_node_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let mut matched = 0;
    modified
        .plan
        .apply_edits(&edits, target, &mut matched, &mut warnings);

    if let Some(target) = target {
        if matched == 0 {
            let warning = format!("No node of type '{target}' in the plan");
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }
    }

    (modified, warnings)
}

/// One row of a flattened plan tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    /// Pre-order index of the node
    pub id: usize,
    pub parent_id: Option<usize>,
    pub depth: usize,
    pub label: String,
    pub node_type: String,
    pub relation: Option<String>,
    pub startup_cost: f64,
    pub total_cost: f64,
    pub rows: Option<f64>,
}

/// Plan flattened in pre-order for tree widgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanTree {
    pub nodes: Vec<TreeNode>,
}

impl PlanTree {
    pub fn from_plan(plan: &QueryPlan) -> Self {
        let mut nodes = Vec::new();
        flatten(&plan.plan, None, 0, &mut nodes);
        Self { nodes }
    }
}

fn flatten(node: &PlanNode, parent_id: Option<usize>, depth: usize, out: &mut Vec<TreeNode>) {
    let id = out.len();
    out.push(TreeNode {
        id,
        parent_id,
        depth,
        label: node.label(),
        node_type: node.node_type.clone(),
        relation: node.relation_name.clone(),
        startup_cost: node.startup_cost,
        total_cost: node.total_cost,
        rows: node.plan_rows,
    });
    for child in &node.plans {
        flatten(child, Some(id), depth + 1, out);
    }
}

/// Options for DOT rendering.
#[derive(Debug, Clone, Default)]
pub struct DotOptions {
    /// Graph caption drawn above the tree.
    pub title: Option<String>,
    /// Operators to fill, matched case-insensitively.
    pub highlight: Vec<String>,
}

/// Escape text for use inside a double-quoted DOT string.
fn escape_dot(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Render a plan as a Graphviz digraph, root at the top.
pub fn to_dot(plan: &QueryPlan, options: &DotOptions) -> String {
    let mut dot = String::from("digraph plan {\n");
    dot.push_str("  graph [rankdir=TB, fontname=\"Helvetica\"];\n");
    dot.push_str("  node [shape=box, style=\"rounded\", fontname=\"Helvetica\", fontsize=10];\n");
    if let Some(title) = options.title.as_deref() {
        let _ = writeln!(dot, "  labelloc=t;\n  label=\"{}\";", escape_dot(title));
    }

    let mut next_id = 0;
    write_dot_node(&plan.plan, options, &mut next_id, &mut dot);

    dot.push_str("}\n");
    dot
}

fn write_dot_node(node: &PlanNode, options: &DotOptions, next_id: &mut usize, dot: &mut String) -> usize {
    let id = *next_id;
    *next_id += 1;

    let mut label = escape_dot(&node.label());
    let _ = write!(
        label,
        "\\ncost={:.2}..{:.2}",
        node.startup_cost, node.total_cost
    );
    if let Some(rows) = node.plan_rows {
        let _ = write!(label, " rows={rows:.0}");
    }

    let highlighted = options
        .highlight
        .iter()
        .any(|h| h.eq_ignore_ascii_case(&node.node_type));
    if highlighted {
        let _ = writeln!(
            dot,
            "  n{id} [label=\"{label}\", style=\"rounded,filled\", fillcolor=\"#ffe08a\"];"
        );
    } else {
        let _ = writeln!(dot, "  n{id} [label=\"{label}\"];");
    }

    for child in &node.plans {
        let child_id = write_dot_node(child, options, next_id, dot);
        let _ = writeln!(dot, "  n{id} -> n{child_id};");
    }
    id
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Trimmed output of `EXPLAIN (FORMAT JSON)` for a TPC-H style join.
    pub(crate) fn sample_explain() -> Value {
        json!([{
            "Plan": {
                "Node Type": "Hash Join",
                "Parallel Aware": false,
                "Join Type": "Inner",
                "Startup Cost": 4.58,
                "Total Cost": 52.32,
                "Plan Rows": 150,
                "Plan Width": 130,
                "Inner Unique": true,
                "Hash Cond": "(c.c_nationkey = n.n_nationkey)",
                "Plans": [
                    {
                        "Node Type": "Seq Scan",
                        "Parent Relationship": "Outer",
                        "Parallel Aware": false,
                        "Relation Name": "customer",
                        "Alias": "c",
                        "Startup Cost": 0.00,
                        "Total Cost": 45.50,
                        "Plan Rows": 150,
                        "Plan Width": 26,
                        "Filter": "(c_acctbal > '0'::numeric)"
                    },
                    {
                        "Node Type": "Hash",
                        "Parent Relationship": "Inner",
                        "Parallel Aware": false,
                        "Startup Cost": 4.25,
                        "Total Cost": 4.25,
                        "Plan Rows": 25,
                        "Plan Width": 108,
                        "Plans": [
                            {
                                "Node Type": "Index Scan",
                                "Parent Relationship": "Outer",
                                "Parallel Aware": false,
                                "Scan Direction": "Forward",
                                "Index Name": "nation_pkey",
                                "Relation Name": "nation",
                                "Alias": "n",
                                "Startup Cost": 0.14,
                                "Total Cost": 4.25,
                                "Plan Rows": 25,
                                "Plan Width": 108
                            }
                        ]
                    }
                ]
            },
            "Planning Time": 0.215
        }])
    }

    pub(crate) fn sample_plan() -> QueryPlan {
        parse_explain_output(sample_explain()).unwrap()
    }

    #[test]
    fn parses_explain_array_and_keeps_unknown_keys() {
        let plan = sample_plan();

        assert_eq!(plan.plan.node_type, "Hash Join");
        assert_eq!(plan.total_cost(), 52.32);
        assert_eq!(plan.planning_time, Some(0.215));
        assert_eq!(plan.plan.extra.get("Inner Unique"), Some(&json!(true)));
        assert_eq!(plan.plan.plans.len(), 2);
        assert_eq!(
            plan.plan.plans[1].plans[0].extra.get("Scan Direction"),
            Some(&json!("Forward"))
        );
    }

    #[test]
    fn serialises_back_with_postgres_key_names() {
        let plan = sample_plan();
        let value = serde_json::to_value(&plan).unwrap();

        let root = &value["Plan"];
        assert_eq!(root["Node Type"], "Hash Join");
        assert_eq!(root["Hash Cond"], "(c.c_nationkey = n.n_nationkey)");
        assert_eq!(root["Inner Unique"], true);
        assert_eq!(root["Plans"][0]["Relation Name"], "customer");
        assert!(root.get("Relation Name").is_none());

        let reparsed: QueryPlan = serde_json::from_value(value).unwrap();
        assert_eq!(reparsed, plan);
    }

    #[test]
    fn accepts_bare_object_and_rejects_other_shapes() {
        let bare = sample_explain()[0].clone();
        assert!(parse_explain_output(bare).is_ok());

        assert!(matches!(
            parse_explain_output(json!([])),
            Err(AppError::MalformedPlan(_))
        ));
        assert!(matches!(
            parse_explain_output(json!("Seq Scan")),
            Err(AppError::MalformedPlan(_))
        ));
        assert!(matches!(
            parse_explain_output(json!([{"Plan": {"Node Type": "Result"}}])),
            Err(AppError::MalformedPlan(_))
        ));
    }

    #[test]
    fn walk_is_pre_order() {
        let plan = sample_plan();
        let types: Vec<&str> = plan.plan.walk().map(|n| n.node_type.as_str()).collect();

        assert_eq!(types, ["Hash Join", "Seq Scan", "Hash", "Index Scan"]);
        assert_eq!(plan.plan.node_count(), 4);
    }

    #[test]
    fn operator_counts_group_by_node_type() {
        let counts = sample_plan().plan.operator_counts();

        assert_eq!(counts.len(), 4);
        assert_eq!(counts["Seq Scan"], 1);
        assert_eq!(counts.keys().next().map(String::as_str), Some("Hash"));
    }

    #[test]
    fn labels_mention_index_relation_and_alias() {
        let plan = sample_plan();
        let scan = &plan.plan.plans[1].plans[0];

        assert_eq!(scan.label(), "Index Scan using nation_pkey on nation n");
        assert_eq!(plan.plan.label(), "Hash Join");
    }

    #[test]
    fn modifications_leave_the_original_untouched() {
        let plan = sample_plan();
        let before = plan.clone();
        let modifications = Modifications {
            node_type: Some("Merge Join".into()),
            target_node_type: Some("Hash Join".into()),
            properties: Map::new(),
        };

        let (modified, warnings) = apply_modifications(&plan, &modifications);

        assert_eq!(plan, before);
        assert!(warnings.is_empty());
        assert_eq!(modified.plan.node_type, "Merge Join");
        assert_eq!(modified.plan.plans, plan.plan.plans);
    }

    #[test]
    fn targeted_edits_reach_nodes_below_non_matching_parents() {
        let plan = sample_plan();
        let modifications = Modifications {
            node_type: Some("Seq Scan".into()),
            target_node_type: Some("index scan".into()),
            properties: Map::new(),
        };

        let (modified, warnings) = apply_modifications(&plan, &modifications);

        assert!(warnings.is_empty());
        assert_eq!(modified.plan.node_type, "Hash Join");
        assert_eq!(modified.plan.plans[1].plans[0].node_type, "Seq Scan");
    }

    #[test]
    fn inapplicable_properties_produce_one_warning_each() {
        let plan = sample_plan();
        let mut properties = Map::new();
        properties.insert("Join Type".into(), json!("Left"));
        properties.insert("Total Cost".into(), json!(10.0));

        let (modified, warnings) = apply_modifications(
            &plan,
            &Modifications {
                properties,
                ..Default::default()
            },
        );

        assert_eq!(modified.plan.join_type.as_deref(), Some("Left"));
        assert!(modified.plan.walk().all(|n| n.total_cost == 10.0));
        assert_eq!(
            warnings,
            [
                "Modification 'Join Type' not applicable to node Seq Scan",
                "Modification 'Join Type' not applicable to node Hash",
                "Modification 'Join Type' not applicable to node Index Scan",
            ]
        );
    }

    #[test]
    fn wrong_value_types_are_reported() {
        let mut node = sample_plan().plan;

        assert_eq!(
            node.set_property("Total Cost", &json!("cheap")),
            Err(EditRejection::WrongType("number"))
        );
        assert_eq!(
            node.set_property("Plans", &json!([])),
            Err(EditRejection::NotApplicable)
        );
        assert_eq!(node.set_property("Inner Unique", &json!(false)), Ok(()));
        assert_eq!(node.extra["Inner Unique"], json!(false));
    }

    #[test]
    fn missing_target_is_reported() {
        let (_, warnings) = apply_modifications(
            &sample_plan(),
            &Modifications {
                node_type: Some("Hash Join".into()),
                target_node_type: Some("Merge Join".into()),
                properties: Map::new(),
            },
        );

        assert_eq!(warnings, ["No node of type 'Merge Join' in the plan"]);
    }

    #[test]
    fn tree_is_flattened_with_parents_and_depths() {
        let tree = PlanTree::from_plan(&sample_plan());
        let shape: Vec<(usize, Option<usize>, usize)> = tree
            .nodes
            .iter()
            .map(|n| (n.id, n.parent_id, n.depth))
            .collect();

        assert_eq!(
            shape,
            [(0, None, 0), (1, Some(0), 1), (2, Some(0), 1), (3, Some(2), 2)]
        );
        assert_eq!(tree.nodes[1].relation.as_deref(), Some("customer"));
    }

    #[test]
    fn dot_has_one_line_per_node_and_edge() {
        let dot = to_dot(&sample_plan(), &DotOptions::default());

        assert!(dot.starts_with("digraph plan {"));
        assert!(dot.trim_end().ends_with('}'));
        assert_eq!(dot.matches("[label=").count(), 4);
        assert_eq!(dot.matches(" -> ").count(), 3);
        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.contains("n2 -> n3;"));
        assert!(dot.contains("cost=4.58..52.32 rows=150"));
    }

    #[test]
    fn dot_escapes_quotes_and_highlights_operators() {
        let mut plan = sample_plan();
        plan.plan.plans[0].relation_name = Some("we\"ird".into());

        let dot = to_dot(
            &plan,
            &DotOptions {
                title: Some("QEP \"orders\"".into()),
                highlight: vec!["seq scan".into()],
            },
        );

        assert!(dot.contains("on we\\\"ird"));
        assert!(dot.contains("label=\"QEP \\\"orders\\\"\";"));
        assert_eq!(dot.matches("fillcolor").count(), 1);
    }
}
