use convert_case::{Case, Casing};

/// Names a database object may have for a Rust identifier, in probing order:
/// `snake_case`, `UPPER_SNAKE`, then `lowersimple`.
pub fn candidates(identifier: &str) -> Vec<String> {
    let snake = identifier.to_case(Case::Snake);
    let all = [
        identifier.to_case(Case::UpperSnake),
        snake.replace('_', ""),
    ];
    let mut result = vec![snake];
    for name in all {
        if !result.contains(&name) {
            result.push(name);
        }
    }
    result
}

/// Last path segment of a type name, `app::model::Order` becomes `Order`.
pub fn simple_type_name(type_name: &str) -> &str {
    let name = type_name.split('<').next().unwrap_or(type_name);
    name.rsplit("::").next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_of_candidates() {
        assert_eq!(
            candidates("OrderLine"),
            vec!["order_line", "ORDER_LINE", "orderline"]
        );
        assert_eq!(candidates("status"), vec!["status", "STATUS"]);
    }

    #[test]
    fn simple_names() {
        assert_eq!(simple_type_name("shop::model::OrderLine"), "OrderLine");
        assert_eq!(simple_type_name("Customer"), "Customer");
    }
}
