use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::constraints::Constraint;
use crate::schema::Schema;

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for FK dependency ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

impl FkGraphReport {
    pub fn has_cycle(&self) -> bool {
        self.cycle.is_some()
    }
}

/// Build a deterministic FK dependency report: referenced tables come before
/// the tables that reference them.
pub fn build_fk_graph_report(schema: &Schema) -> FkGraphReport {
    let graph = build_adjacency(schema);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = FkGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => FkGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => FkGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

fn build_adjacency(schema: &Schema) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for table in schema.tables.values() {
        graph.entry(table.name.clone()).or_default();

        for constraint in table.constraints.values() {
            if let Constraint::ForeignKey(fk) = constraint {
                graph
                    .entry(fk.target_table_name.clone())
                    .or_default()
                    .insert(table.name.clone());
            }
        }
    }

    graph
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<String, usize> =
        graph.keys().map(|node| (node.clone(), 0)).collect();

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter_map(|(node, count)| (*count == 0).then(|| node.clone()))
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
        order.push(node);
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        Err(indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then_some(node))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{ForeignKeyAction, ForeignKeyConstraint};
    use crate::schema::{Column, Table};

    fn fk(name: &str, column: &str, target: &str) -> Constraint {
        Constraint::ForeignKey(ForeignKeyConstraint {
            name: name.to_string(),
            column_names: vec![column.to_string()],
            target_table_name: target.to_string(),
            target_column_names: vec!["id".to_string()],
            update_constraint: ForeignKeyAction::NoAction,
            delete_constraint: ForeignKeyAction::NoAction,
        })
    }

    #[test]
    fn toposort_reports_cycle() {
        let mut users = Table::new("users");
        users.insert_column(Column::new("id", "int"));
        users.insert_constraint(fk("fk_self", "id", "users"));

        let mut schema = Schema::default();
        schema.insert_table(users);

        let report = build_fk_graph_report(&schema);
        assert!(report.topo_order.is_none());
        assert!(report.has_cycle());
        assert!(report.cycle.unwrap().contains(&"users".to_string()));
    }

    #[test]
    fn toposort_orders_dependencies() {
        let mut orders = Table::new("orders");
        orders.insert_column(Column::new("id", "int"));
        orders.insert_column(Column::new("user_id", "int"));
        orders.insert_constraint(fk("fk_orders_user", "user_id", "users"));

        let mut users = Table::new("users");
        users.insert_column(Column::new("id", "int"));

        let mut schema = Schema::default();
        schema.insert_table(orders);
        schema.insert_table(users);

        let report = build_fk_graph_report(&schema);
        assert_eq!(report.summary.nodes, 2);
        assert_eq!(report.summary.edges, 1);
        let order = report.topo_order.expect("expected toposort");
        let users_idx = order.iter().position(|item| item == "users").unwrap();
        let orders_idx = order.iter().position(|item| item == "orders").unwrap();
        assert!(users_idx < orders_idx);
    }
}
