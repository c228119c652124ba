use super::{Build, QueryCompiler, Resolved};
use crate::{
    AsValue, DataType, Filter, Filters, Operator, QuarryError, Result, Value, truncate_long,
};
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Converts text operands (from comma lists and shorthands) to the column type.
pub(crate) fn coerce(value: Value, data_type: DataType, field: &str) -> Result<Value> {
    let Value::Varchar(Some(ref text)) = value else {
        return Ok(value);
    };
    let coerced = match data_type {
        DataType::Integer => <i64 as AsValue>::parse(text).map(AsValue::as_value),
        DataType::Decimal => <Decimal as AsValue>::parse(text).map(AsValue::as_value),
        DataType::Float => <f64 as AsValue>::parse(text).map(AsValue::as_value),
        DataType::Boolean => <bool as AsValue>::parse(text).map(AsValue::as_value),
        DataType::Date => <Date as AsValue>::parse(text).map(AsValue::as_value),
        DataType::Time => <Time as AsValue>::parse(text).map(AsValue::as_value),
        DataType::Timestamp => <PrimitiveDateTime as AsValue>::parse(text).map(AsValue::as_value),
        DataType::TimestampWithTimezone => <OffsetDateTime as AsValue>::parse(text).map(AsValue::as_value),
        DataType::Uuid => <Uuid as AsValue>::parse(text).map(AsValue::as_value),
        _ => return Ok(value),
    };
    coerced.map_err(|e| {
        e.context(QuarryError::Validation(format!(
            "Value `{}` does not fit field `{field}`",
            truncate_long!(text)
        )))
    })
}

impl<'a> QueryCompiler<'a> {
    /// Writes the tree, nothing at all when it has no leaves.
    pub(crate) fn write_filters(
        &self,
        build: &mut Build<'a>,
        out: &mut String,
        filters: &Filters,
    ) -> Result<()> {
        let nested = filters
            .nested
            .iter()
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>();
        let terms = filters.filters.len() + nested.len();
        if terms == 0 {
            return Ok(());
        }
        let separator = match filters.operator {
            crate::BoolOperator::And => " AND ",
            crate::BoolOperator::Or => " OR ",
        };
        if terms > 1 {
            out.push('(');
        }
        let mut first = true;
        for filter in &filters.filters {
            if !first {
                out.push_str(separator);
            }
            first = false;
            self.write_filter(build, out, filter)?;
        }
        for filters in nested {
            if !first {
                out.push_str(separator);
            }
            first = false;
            self.write_filters(build, out, filters)?;
        }
        if terms > 1 {
            out.push(')');
        }
        Ok(())
    }

    fn bind(&self, build: &mut Build, out: &mut String, base: &str, value: Value, lower: bool) {
        let name = build.context.parameter_name(base);
        if lower {
            let mut parameter = String::new();
            self.dialect
                .write_parameter(&mut build.context, &mut parameter, &name);
            self.dialect.write_lower(&mut build.context, out, &parameter);
        } else {
            self.dialect.write_parameter(&mut build.context, out, &name);
        }
        build.params.insert(name, value);
    }

    fn write_filter(&self, build: &mut Build<'a>, out: &mut String, filter: &Filter) -> Result<()> {
        let mut resolved = self.resolve(&filter.left)?;
        if resolved.column.is_relation() {
            resolved = self.local_column(&filter.left, &resolved)?;
        }
        if let Some(relation) = resolved.relation {
            build.join(relation);
        }
        let column = resolved.column;
        let operator = filter.operator;
        let lower = !filter.case_sensitive && column.data_type.is_text();
        let mut expression = self.expression(build, &resolved);
        if operator.is_zero_value() {
            return self.dialect.write_empty_predicate(
                &mut build.context,
                out,
                &expression,
                operator,
                column.data_type,
            );
        }
        if operator.is_geometry() {
            let params = self.dialect.write_geometry_predicate(
                &mut build.context,
                out,
                &expression,
                operator,
                &filter.right,
            )?;
            build.params.extend(params);
            return Ok(());
        }
        if lower {
            let mut lowered = String::new();
            self.dialect
                .write_lower(&mut build.context, &mut lowered, &expression);
            expression = lowered;
        }
        let values = filter
            .right
            .iter()
            .cloned()
            .map(|v| coerce(v, column.data_type, &filter.left))
            .collect::<Result<Vec<_>>>()?;
        match operator {
            Operator::In | Operator::NotIn => {
                self.write_list(build, out, filter, &expression, values, lower)
            }
            Operator::Between => self.write_between(build, out, filter, &expression, values, lower),
            _ => {
                let [value] = <[Value; 1]>::try_from(values).map_err(|v| {
                    QuarryError::validation(format!(
                        "Operator `{operator}` on `{}` takes exactly one value, {} given",
                        filter.left,
                        v.len()
                    ))
                })?;
                self.write_comparison(build, out, filter, &expression, value, lower)
            }
        }
    }

    /// A filter on a relation field compares its single local column.
    fn local_column(&self, path: &str, resolved: &Resolved<'a>) -> Result<Resolved<'a>> {
        let local = resolved
            .column
            .relation
            .as_ref()
            .and_then(|r| match r.local.as_slice() {
                [local] => Some(local),
                _ => None,
            });
        local
            .map(|column| Resolved {
                relation: None,
                column,
            })
            .ok_or_else(|| {
                QuarryError::validation(format!(
                    "Field `{path}` of table {} is a relation, filter on one of its fields as `{path}.field`",
                    self.table.full_name()
                ))
            })
    }

    fn write_comparison(
        &self,
        build: &mut Build,
        out: &mut String,
        filter: &Filter,
        expression: &str,
        value: Value,
        lower: bool,
    ) -> Result<()> {
        let operator = filter.operator;
        if value.is_null() {
            out.push_str(expression);
            return match operator {
                Operator::Equal => {
                    out.push_str(" IS NULL");
                    Ok(())
                }
                Operator::NotEqual => {
                    out.push_str(" IS NOT NULL");
                    Ok(())
                }
                _ => Err(QuarryError::validation(format!(
                    "Operator `{operator}` on `{}` cannot compare with null",
                    filter.left
                ))),
            };
        }
        let pattern = |prefix: bool, suffix: bool| {
            let text = match &value {
                Value::Varchar(Some(v)) => v.clone(),
                v => v.to_string(),
            };
            let prefix = if prefix && !text.starts_with('%') { "%" } else { "" };
            let suffix = if suffix && !text.ends_with('%') { "%" } else { "" };
            Value::Varchar(Some(format!("{prefix}{text}{suffix}")))
        };
        let (sql, value) = match operator {
            Operator::Like => (" LIKE ", pattern(!has_wildcard(&value), !has_wildcard(&value))),
            Operator::NotLike => (
                " NOT LIKE ",
                pattern(!has_wildcard(&value), !has_wildcard(&value)),
            ),
            Operator::Contains => (" LIKE ", pattern(true, true)),
            Operator::StartsWith => (" LIKE ", pattern(false, true)),
            Operator::EndsWith => (" LIKE ", pattern(true, false)),
            Operator::DoesNotStartWith => (" NOT LIKE ", pattern(false, true)),
            Operator::DoesNotEndWith => (" NOT LIKE ", pattern(true, false)),
            Operator::Equal => (" = ", value.clone()),
            Operator::NotEqual => (" <> ", value.clone()),
            Operator::Greater => (" > ", value.clone()),
            Operator::GreaterEqual => (" >= ", value.clone()),
            Operator::Less => (" < ", value.clone()),
            Operator::LessEqual => (" <= ", value.clone()),
            _ => {
                return Err(QuarryError::validation(format!(
                    "Operator `{operator}` is not a comparison"
                )));
            }
        };
        out.push_str(expression);
        out.push_str(sql);
        self.bind(build, out, &filter.left, value, lower);
        if let Some(escape) = filter.escape {
            if sql.ends_with("LIKE ") {
                self.dialect
                    .write_like_escape(&mut build.context, out, escape);
            }
        }
        Ok(())
    }

    fn write_list(
        &self,
        build: &mut Build,
        out: &mut String,
        filter: &Filter,
        expression: &str,
        values: Vec<Value>,
        lower: bool,
    ) -> Result<()> {
        let include = filter.operator == Operator::In;
        if values.is_empty() {
            return Err(QuarryError::validation(format!(
                "Operator `{}` on `{}` needs at least one value",
                filter.operator, filter.left
            )));
        }
        if values.iter().any(Value::is_null) {
            out.push('(');
            for (i, value) in values.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(if include { " OR " } else { " AND " });
                }
                out.push_str(expression);
                if value.is_null() {
                    out.push_str(if include { " IS NULL" } else { " IS NOT NULL" });
                } else {
                    out.push_str(if include { " = " } else { " <> " });
                    self.bind(build, out, &filter.left, value, lower);
                }
            }
            out.push(')');
            return Ok(());
        }
        let element = values
            .first()
            .map(Value::as_empty)
            .unwrap_or(Value::Varchar(None));
        let values = if lower {
            values.iter().map(Value::to_lowercase).collect()
        } else {
            values
        };
        out.push_str(expression);
        out.push_str(if include { " IN (" } else { " NOT IN (" });
        self.bind(
            build,
            out,
            &filter.left,
            Value::List(Some(values), Box::new(element)),
            false,
        );
        out.push(')');
        Ok(())
    }

    fn write_between(
        &self,
        build: &mut Build,
        out: &mut String,
        filter: &Filter,
        expression: &str,
        values: Vec<Value>,
        lower: bool,
    ) -> Result<()> {
        let [from, to] = <[Value; 2]>::try_from(values).map_err(|v| {
            QuarryError::validation(format!(
                "Operator `between` on `{}` takes exactly two values, {} given",
                filter.left,
                v.len()
            ))
        })?;
        out.push_str(expression);
        match (from.is_null(), to.is_null()) {
            (false, false) => {
                out.push_str(" BETWEEN ");
                self.bind(build, out, &filter.left, from, lower);
                out.push_str(" AND ");
                self.bind(build, out, &filter.left, to, lower);
            }
            (false, true) => {
                out.push_str(" >= ");
                self.bind(build, out, &filter.left, from, lower);
            }
            (true, false) => {
                out.push_str(" <= ");
                self.bind(build, out, &filter.left, to, lower);
            }
            (true, true) => {
                return Err(QuarryError::validation(format!(
                    "Operator `between` on `{}` needs at least one bound",
                    filter.left
                )));
            }
        }
        Ok(())
    }
}

/// A `like` operand carrying its own wildcards is used as is.
fn has_wildcard(value: &Value) -> bool {
    matches!(value, Value::Varchar(Some(v)) if v.contains('%'))
}
