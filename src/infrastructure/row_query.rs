//! 行查询描述
//!
//! 用数据结构描述一次 PostgREST 风格的查询（select / ilike / eq / order / limit），
//! 由具体的 `RowStore` 实现决定如何执行。

/// 过滤条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// 不区分大小写的模式匹配，`*` 为通配符
    ILike { column: String, pattern: String },
    /// 精确相等
    Eq { column: String, value: String },
}

/// 排序条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// 一次行查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    table: String,
    columns: Vec<String>,
    filters: Vec<Filter>,
    order: Vec<Order>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl RowQuery {
    /// 创建针对某张表的查询（默认 select=*）
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// 只取指定列，逗号分隔
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "*")
            .map(str::to_string)
            .collect();
        self
    }

    /// 包含匹配：`needle` 中的空白被当作通配符，容忍存储中空格不一致
    pub fn ilike_contains(mut self, column: &str, needle: &str) -> Self {
        let words: Vec<&str> = needle.split_whitespace().collect();
        let pattern = format!("*{}*", words.join("*"));
        self.filters.push(Filter::ILike {
            column: column.to_string(),
            pattern,
        });
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            descending: true,
        });
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            descending: false,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// 选择的列，空表示全部
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> &[Order] {
        &self.order
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<usize> {
        self.offset
    }

    /// 转换为 PostgREST 查询参数
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        let select = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        params.push(("select".to_string(), select));

        for filter in &self.filters {
            match filter {
                Filter::ILike { column, pattern } => {
                    params.push((column.clone(), format!("ilike.{}", pattern)));
                }
                Filter::Eq { column, value } => {
                    params.push((column.clone(), format!("eq.{}", value)));
                }
            }
        }

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| {
                    format!(
                        "{}.{}",
                        o.column,
                        if o.descending { "desc" } else { "asc" }
                    )
                })
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }

        params
    }
}

/// 判断 `text` 是否符合 `*` 通配模式（不区分大小写）
///
/// 与远端 `ilike` 的语义一致：不以 `*` 开头/结尾的模式需要锚定首尾。
pub fn wildcard_match(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    let pieces: Vec<&str> = pattern.split('*').collect();

    // 没有通配符时就是精确匹配
    if pieces.len() == 1 {
        return text == pattern;
    }

    let first = pieces[0];
    let last = pieces[pieces.len() - 1];
    if !text.starts_with(first) {
        return false;
    }

    let mut rest = &text[first.len()..];
    for piece in &pieces[1..pieces.len() - 1] {
        match rest.find(piece) {
            Some(pos) => rest = &rest[pos + piece.len()..],
            None => return false,
        }
    }

    rest.len() >= last.len() && rest.ends_with(last)
}
