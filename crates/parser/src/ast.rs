use expr::Expr;
use types::SqlType;

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    CreateTable {
        name: String,
        columns: Vec<ColumnDef>,
    },
    CreateIndex {
        name: String,
        table: String,
        column: String,
        unique: bool,
    },
    DropIndex {
        name: String,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<Expr>,
    },
    Select {
        items: Vec<SelectItem>,
        table: String,
        selection: Option<Expr>,
        group_by: Vec<String>,
        order_by: Vec<OrderByItem>,
        limit: Option<u64>,
    },
    Update {
        table: String,
        assignments: Vec<(String, Expr)>,
        selection: Option<Expr>,
    },
    Delete {
        table: String,
        selection: Option<Expr>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: SqlType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggFunc {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggFunc::Count => "COUNT",
            AggFunc::Sum => "SUM",
            AggFunc::Avg => "AVG",
            AggFunc::Max => "MAX",
            AggFunc::Min => "MIN",
        }
    }
}

/// The argument to an aggregate call: either a bare column or `*`
/// (only meaningful for COUNT).
#[derive(Clone, Debug, PartialEq)]
pub enum AggArg {
    Star,
    Column(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectItem {
    Wildcard,
    Column(String),
    Aggregate {
        func: AggFunc,
        arg: AggArg,
        alias: Option<String>,
    },
}

impl SelectItem {
    /// The output column name when no alias is given: `F(arg)` / `F(*)`.
    pub fn default_label(&self) -> String {
        match self {
            SelectItem::Wildcard => "*".to_string(),
            SelectItem::Column(c) => c.clone(),
            SelectItem::Aggregate { func, arg, alias } => {
                if let Some(a) = alias {
                    return a.clone();
                }
                let arg_str = match arg {
                    AggArg::Star => "*".to_string(),
                    AggArg::Column(c) => c.clone(),
                };
                format!("{}({})", func.as_str(), arg_str)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderByItem {
    pub column: String,
    pub direction: SortDirection,
}
