//! Common test utilities: an in-memory table engine over the example graph
//! and a few fragments shared by the integration tests.
use boxwright::graph::ResolvedNode;
use boxwright::prelude::*;

/// A tiny column store, enough to check what finalized graphs compute.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Literal>>,
}

impl Table {
    #[allow(dead_code)]
    pub fn column(&self, name: &str) -> Vec<String> {
        let Some(index) = self.columns.iter().position(|c| c == name) else {
            return Vec::new();
        };
        self.rows.iter().map(|row| row[index].to_string()).collect()
    }

    /// Rows rendered as text, sorted, so results can be compared regardless
    /// of row order.
    #[allow(dead_code)]
    pub fn sorted_rows(&self, columns: &[&str]) -> Vec<Vec<String>> {
        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|name| self.columns.iter().position(|c| c == name))
            .collect();
        let mut rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].to_string()).collect())
            .collect();
        rows.sort();
        rows
    }
}

/// The 4-vertex example dataset.
#[allow(dead_code)]
pub fn example_table() -> Table {
    let people = [
        (0.0, "Adam", 20.3),
        (1.0, "Eve", 18.2),
        (2.0, "Bob", 50.3),
        (3.0, "Isolated Joe", 2.0),
    ];
    Table {
        columns: vec!["id".to_string(), "name".to_string(), "age".to_string()],
        rows: people
            .iter()
            .map(|(id, name, age)| {
                vec![
                    Literal::Number(*id),
                    Literal::String(name.to_string()),
                    Literal::Number(*age),
                ]
            })
            .collect(),
    }
}

/// Runs finalized graphs made of `createExampleGraph`, `selectColumns`,
/// `filterEquals`, `joinOnId` and `saveToSnapshot` operations.
#[derive(Debug, Default)]
pub struct TableEngine {
    /// Snapshots written by triggered `saveToSnapshot` nodes, in order.
    pub snapshots: Vec<(String, Table)>,
    /// Every operation evaluated, in evaluation order.
    pub evaluated: Vec<String>,
}

impl Engine for TableEngine {
    type Output = Table;

    fn compute(
        &mut self,
        graph: &ExecutionGraph,
        target: &Resolved,
    ) -> Result<Table, ExecutionError> {
        self.table(graph, target)
    }

    fn trigger(&mut self, graph: &ExecutionGraph, effects: &[NodeId]) -> Result<(), ExecutionError> {
        for &id in effects {
            let node = graph
                .node(id)
                .ok_or_else(|| ExecutionError::new(format!("unknown node #{}", id)))?;
            let table = self.evaluate(graph, node)?;
            if node.op == "saveToSnapshot" {
                self.snapshots.push((text_param(node, "path")?, table));
            }
        }
        Ok(())
    }
}

impl TableEngine {
    #[allow(dead_code)]
    pub fn snapshot_paths(&self) -> Vec<&str> {
        self.snapshots.iter().map(|(p, _)| p.as_str()).collect()
    }

    fn table(&mut self, graph: &ExecutionGraph, source: &Resolved) -> Result<Table, ExecutionError> {
        match source {
            Resolved::Literal(l) => Err(ExecutionError::new(format!(
                "expected a table, got the constant {}",
                l
            ))),
            Resolved::Handle(h) => {
                let node = graph
                    .node(h.node)
                    .ok_or_else(|| ExecutionError::new(format!("unknown node #{}", h.node)))?;
                self.evaluate(graph, node)
            }
        }
    }

    fn input(
        &mut self,
        graph: &ExecutionGraph,
        node: &ResolvedNode,
        name: &str,
    ) -> Result<Table, ExecutionError> {
        let source = node.input(name).ok_or_else(|| {
            ExecutionError::new(format!("{} #{} has no input '{}'", node.op, node.id, name))
        })?;
        self.table(graph, source)
    }

    fn evaluate(&mut self, graph: &ExecutionGraph, node: &ResolvedNode) -> Result<Table, ExecutionError> {
        self.evaluated.push(node.op.clone());
        match node.op.as_str() {
            "createExampleGraph" => Ok(example_table()),
            "selectColumns" => {
                let input = self.input(graph, node, "input")?;
                let wanted = text_param(node, "columns")?;
                let mut indices = Vec::new();
                let mut columns = Vec::new();
                for name in wanted.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    let index = input.columns.iter().position(|c| c == name).ok_or_else(|| {
                        ExecutionError::new(format!("no column '{}' to select", name))
                    })?;
                    indices.push(index);
                    columns.push(name.to_string());
                }
                let rows = input
                    .rows
                    .iter()
                    .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                    .collect();
                Ok(Table { columns, rows })
            }
            "filterEquals" => {
                let input = self.input(graph, node, "input")?;
                let column = text_param(node, "column")?;
                let value = text_param(node, "value")?;
                let index = input
                    .columns
                    .iter()
                    .position(|c| *c == column)
                    .ok_or_else(|| ExecutionError::new(format!("no column '{}' to filter", column)))?;
                let rows = input
                    .rows
                    .into_iter()
                    .filter(|row| row[index].to_string() == value)
                    .collect();
                Ok(Table {
                    columns: input.columns,
                    rows,
                })
            }
            "joinOnId" => {
                let left = self.input(graph, node, "left")?;
                let right = self.input(graph, node, "right")?;
                let left_id = id_column(&left)?;
                let right_id = id_column(&right)?;
                let mut columns = left.columns.clone();
                columns.extend(
                    right
                        .columns
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != right_id)
                        .map(|(_, c)| c.clone()),
                );
                let mut rows = Vec::new();
                for row in &left.rows {
                    if let Some(other) = right.rows.iter().find(|r| r[right_id] == row[left_id]) {
                        let mut joined = row.clone();
                        joined.extend(
                            other
                                .iter()
                                .enumerate()
                                .filter(|(i, _)| *i != right_id)
                                .map(|(_, v)| v.clone()),
                        );
                        rows.push(joined);
                    }
                }
                Ok(Table { columns, rows })
            }
            "saveToSnapshot" => self.input(graph, node, "input"),
            other => Err(ExecutionError::new(format!("unsupported operation '{}'", other))),
        }
    }
}

fn text_param(node: &ResolvedNode, name: &str) -> Result<String, ExecutionError> {
    node.param(name)
        .map(|l| l.to_string())
        .ok_or_else(|| ExecutionError::new(format!("{} #{} needs '{}'", node.op, node.id, name)))
}

fn id_column(table: &Table) -> Result<usize, ExecutionError> {
    table
        .columns
        .iter()
        .position(|c| c == "id")
        .ok_or_else(|| ExecutionError::new("table has no id column"))
}

/// Adds a `createExampleGraph` node.
#[allow(dead_code)]
pub fn example_graph(scope: &mut Scope<'_>) -> Result<Value, BindingError> {
    scope.apply(Operation::new("createExampleGraph"))
}

/// `select(x, column)`: keeps `id` and the column named by the call site.
#[allow(dead_code)]
pub fn select_fragment(session: &mut Session) -> Fragment {
    session.fragment(
        "select",
        Signature::new().positional("x").positional("column"),
        |scope, args| {
            let columns = pp(format!("id,{}", args.template("column")?));
            let out = scope.apply(
                Operation::new("selectColumns")
                    .input("input", args.get("x")?)
                    .param("columns", columns),
            )?;
            Ok(Outputs::single(out))
        },
    )
}

/// `save(t)`: registers a snapshot of its input at `path` as a side effect.
#[allow(dead_code)]
pub fn save_fragment(session: &mut Session, name: &str, path: &'static str) -> Fragment {
    session.fragment(name, Signature::new().positional("t"), move |scope, args| {
        let node = scope.add(
            Operation::new("saveToSnapshot")
                .input("input", args.get("t")?)
                .param("path", path)
                .sink(),
        )?;
        scope.register(node.id())?;
        Ok(Outputs::None)
    })
}

#[allow(dead_code)]
pub fn env(pairs: &[(&str, &str)]) -> Environment {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Installs a test subscriber so `RUST_LOG=debug` shows the library's logs.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
