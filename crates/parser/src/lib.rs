//! Recursive-descent SQL parser (§4.2). No backtracking: each production
//! either consumes a definite token or raises a parse error naming what it
//! expected. The condition grammar (`cond := cmp (AND|OR cmp)*`) is left-
//! associative with no precedence between AND and OR, matching the
//! reference parser's flat chain.

mod ast;
mod lexer;
#[cfg(test)]
mod tests;

pub use ast::*;
pub use lexer::{Token, TokenKind};

use common::{DbError, DbResult};
use expr::{BinaryOp, Expr};
use types::{SqlType, Value};

/// Parses `sql` into zero or more statements. Statements are terminated by
/// `;` or EOF; stray semicolons between statements are ignored.
pub fn parse_sql(sql: &str) -> DbResult<Vec<Statement>> {
    let tokens = lexer::tokenize(sql);
    let mut parser = Parser { tokens, pos: 0 };
    let mut statements = Vec::new();

    while !parser.check(TokenKind::Eof) {
        while parser.check(TokenKind::Semicolon) {
            parser.advance();
        }
        if parser.check(TokenKind::Eof) {
            break;
        }
        statements.push(parser.parse_statement()?);
        while parser.check(TokenKind::Semicolon) {
            parser.advance();
        }
    }

    Ok(statements)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

fn parse_error(token: &Token, expected: &str) -> DbError {
    DbError::Parse {
        message: format!("unexpected token '{}'", token.lexeme),
        line: token.line,
        column: token.column,
        expected: expected.to_string(),
    }
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> DbResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(parse_error(self.peek(), expected))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> DbResult<String> {
        if self.check(TokenKind::Error) {
            return Err(parse_error(self.peek(), "a valid token"));
        }
        let token = self.expect(TokenKind::Identifier, expected)?;
        Ok(token.lexeme)
    }

    fn parse_statement(&mut self) -> DbResult<Statement> {
        match self.peek().kind {
            TokenKind::Select => self.parse_select(),
            TokenKind::Create => self.parse_create(),
            TokenKind::Insert => self.parse_insert(),
            TokenKind::Update => self.parse_update(),
            TokenKind::Delete => self.parse_delete(),
            TokenKind::Drop => self.parse_drop(),
            _ => Err(parse_error(self.peek(), "a statement keyword")),
        }
    }

    fn parse_create(&mut self) -> DbResult<Statement> {
        self.expect(TokenKind::Create, "CREATE")?;
        if self.check(TokenKind::Table) {
            self.parse_create_table()
        } else if self.check(TokenKind::Index) || self.check(TokenKind::Unique) {
            self.parse_create_index()
        } else {
            Err(parse_error(self.peek(), "TABLE, INDEX or UNIQUE"))
        }
    }

    fn parse_create_table(&mut self) -> DbResult<Statement> {
        self.expect(TokenKind::Table, "TABLE")?;
        let name = self.expect_identifier("a table name")?;
        self.expect(TokenKind::LParen, "'('")?;

        let mut columns = Vec::new();
        loop {
            let col_name = self.expect_identifier("a column name")?;
            let ty = self.parse_column_type()?;
            columns.push(ColumnDef { name: col_name, ty });

            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Statement::CreateTable { name, columns })
    }

    fn parse_column_type(&mut self) -> DbResult<SqlType> {
        if self.check(TokenKind::Int) {
            self.advance();
            Ok(SqlType::Int)
        } else if self.check(TokenKind::Varchar) {
            self.advance();
            Ok(SqlType::Varchar)
        } else {
            Err(parse_error(self.peek(), "INT or VARCHAR"))
        }
    }

    fn parse_create_index(&mut self) -> DbResult<Statement> {
        let unique = if self.check(TokenKind::Unique) {
            self.advance();
            true
        } else {
            false
        };
        self.expect(TokenKind::Index, "INDEX")?;
        let name = self.expect_identifier("an index name")?;
        self.expect(TokenKind::On, "ON")?;
        let table = self.expect_identifier("a table name")?;
        self.expect(TokenKind::LParen, "'('")?;
        let column = self.expect_identifier("a column name")?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Statement::CreateIndex { name, table, column, unique })
    }

    fn parse_drop(&mut self) -> DbResult<Statement> {
        self.expect(TokenKind::Drop, "DROP")?;
        self.expect(TokenKind::Index, "INDEX")?;
        let name = self.expect_identifier("an index name")?;
        Ok(Statement::DropIndex { name })
    }

    fn parse_insert(&mut self) -> DbResult<Statement> {
        self.expect(TokenKind::Insert, "INSERT")?;
        self.expect(TokenKind::Into, "INTO")?;
        let table = self.expect_identifier("a table name")?;

        self.expect(TokenKind::LParen, "'('")?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.expect_identifier("a column name")?);
            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        self.expect(TokenKind::RParen, "')'")?;

        self.expect(TokenKind::Values, "VALUES")?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_literal()?);
            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        self.expect(TokenKind::RParen, "')'")?;

        if columns.len() != values.len() {
            return Err(DbError::Semantic(format!(
                "INSERT column count ({}) does not match value count ({})",
                columns.len(),
                values.len()
            )));
        }

        Ok(Statement::Insert { table, columns, values })
    }

    fn parse_literal(&mut self) -> DbResult<Expr> {
        match self.peek().kind {
            TokenKind::Number | TokenKind::String => {
                let token = self.advance();
                Ok(Expr::Literal(Value::Text(token.lexeme)))
            }
            _ => Err(parse_error(self.peek(), "a literal value")),
        }
    }

    fn parse_select(&mut self) -> DbResult<Statement> {
        self.expect(TokenKind::Select, "SELECT")?;
        let items = self.parse_select_list()?;
        self.expect(TokenKind::From, "FROM")?;
        let table = self.expect_identifier("a table name")?;

        let selection = if self.check(TokenKind::Where) {
            self.advance();
            Some(self.parse_cond()?)
        } else {
            None
        };

        let group_by = if self.check(TokenKind::Group) {
            self.advance();
            self.expect(TokenKind::By, "BY")?;
            self.parse_identifier_list()?
        } else {
            Vec::new()
        };

        let order_by = if self.check(TokenKind::Order) {
            self.advance();
            self.expect(TokenKind::By, "BY")?;
            self.parse_order_by_list()?
        } else {
            Vec::new()
        };

        let limit = if self.check(TokenKind::Limit) {
            self.advance();
            let token = self.expect(TokenKind::Number, "a non-negative integer")?;
            Some(token.lexeme.parse::<u64>().map_err(|_| {
                DbError::Parse {
                    message: format!("invalid LIMIT value '{}'", token.lexeme),
                    line: token.line,
                    column: token.column,
                    expected: "a non-negative integer".to_string(),
                }
            })?)
        } else {
            None
        };

        Ok(Statement::Select { items, table, selection, group_by, order_by, limit })
    }

    fn parse_select_list(&mut self) -> DbResult<Vec<SelectItem>> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_select_item()?);
            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(items)
    }

    fn parse_select_item(&mut self) -> DbResult<SelectItem> {
        if self.check(TokenKind::Star) {
            self.advance();
            return Ok(SelectItem::Wildcard);
        }

        if let Some(func) = self.peek_agg_func() {
            self.advance();
            self.expect(TokenKind::LParen, "'('")?;
            let arg = if self.check(TokenKind::Star) {
                self.advance();
                AggArg::Star
            } else {
                AggArg::Column(self.expect_identifier("a column name or '*'")?)
            };
            self.expect(TokenKind::RParen, "')'")?;

            let alias = if self.check(TokenKind::As) {
                self.advance();
                Some(self.expect_identifier("an alias")?)
            } else {
                None
            };
            return Ok(SelectItem::Aggregate { func, arg, alias });
        }

        Ok(SelectItem::Column(self.expect_identifier("a column name")?))
    }

    fn peek_agg_func(&self) -> Option<AggFunc> {
        match self.peek().kind {
            TokenKind::Count => Some(AggFunc::Count),
            TokenKind::Sum => Some(AggFunc::Sum),
            TokenKind::Avg => Some(AggFunc::Avg),
            TokenKind::Max => Some(AggFunc::Max),
            TokenKind::Min => Some(AggFunc::Min),
            _ => None,
        }
    }

    fn parse_identifier_list(&mut self) -> DbResult<Vec<String>> {
        let mut names = Vec::new();
        loop {
            names.push(self.expect_identifier("a column name")?);
            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(names)
    }

    fn parse_order_by_list(&mut self) -> DbResult<Vec<OrderByItem>> {
        let mut items = Vec::new();
        loop {
            let column = self.expect_identifier("a column name")?;
            let direction = if self.check(TokenKind::Asc) {
                self.advance();
                SortDirection::Asc
            } else if self.check(TokenKind::Desc) {
                self.advance();
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            items.push(OrderByItem { column, direction });
            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(items)
    }

    fn parse_update(&mut self) -> DbResult<Statement> {
        self.expect(TokenKind::Update, "UPDATE")?;
        let table = self.expect_identifier("a table name")?;
        self.expect(TokenKind::Set, "SET")?;

        let mut assignments = Vec::new();
        loop {
            let col = self.expect_identifier("a column name")?;
            self.expect(TokenKind::Eq, "'='")?;
            let value = self.parse_literal()?;
            assignments.push((col, value));
            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }

        let selection = if self.check(TokenKind::Where) {
            self.advance();
            Some(self.parse_cond()?)
        } else {
            None
        };

        Ok(Statement::Update { table, assignments, selection })
    }

    fn parse_delete(&mut self) -> DbResult<Statement> {
        self.expect(TokenKind::Delete, "DELETE")?;
        self.expect(TokenKind::From, "FROM")?;
        let table = self.expect_identifier("a table name")?;

        let selection = if self.check(TokenKind::Where) {
            self.advance();
            Some(self.parse_cond()?)
        } else {
            None
        };

        Ok(Statement::Delete { table, selection })
    }

    /// `cond := cmp (AND|OR cmp)*` — strictly left-associative, no
    /// precedence between AND and OR.
    fn parse_cond(&mut self) -> DbResult<Expr> {
        let mut left = self.parse_cmp()?;
        loop {
            let op = if self.check(TokenKind::And) {
                BinaryOp::And
            } else if self.check(TokenKind::Or) {
                BinaryOp::Or
            } else {
                break;
            };
            self.advance();
            let right = self.parse_cmp()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    /// `cmp := prim op prim`. The operator is optional so that a
    /// parenthesized `(cond)` can stand in for a whole `cmp` term in an
    /// AND/OR chain, overriding the grammar's default left-associativity.
    fn parse_cmp(&mut self) -> DbResult<Expr> {
        let left = self.parse_prim()?;
        match self.peek_comparison_op() {
            Some(op) => {
                self.advance();
                let right = self.parse_prim()?;
                Ok(Expr::Binary { left: Box::new(left), op, right: Box::new(right) })
            }
            None => Ok(left),
        }
    }

    fn peek_comparison_op(&self) -> Option<BinaryOp> {
        match self.peek().kind {
            TokenKind::Eq => Some(BinaryOp::Eq),
            TokenKind::Ne => Some(BinaryOp::Ne),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Le => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Ge => Some(BinaryOp::Ge),
            _ => None,
        }
    }

    /// `prim := NUMBER | STRING | IDENT | ( cond )`
    fn parse_prim(&mut self) -> DbResult<Expr> {
        match self.peek().kind {
            TokenKind::Number | TokenKind::String => {
                let token = self.advance();
                Ok(Expr::Literal(Value::Text(token.lexeme)))
            }
            TokenKind::Identifier => {
                let token = self.advance();
                Ok(Expr::Column { table: None, name: token.lexeme })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_cond()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(parse_error(self.peek(), "NUMBER, STRING, an identifier, or '('")),
        }
    }
}
