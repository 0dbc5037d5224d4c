// ==========================================
// 批量导入管道 - 记录类型字段表
// ==========================================
// 职责: 每种记录类型的标准字段、声明类型、默认别名、默认必填
// 说明: 别名按声明顺序匹配（忽略大小写与首尾空白）
// ==========================================

use crate::domain::types::{ImportKind, ValueType};

/// 标准字段定义
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub display_name: &'static str,
    pub value_type: ValueType,
    pub required: bool,
    pub aliases: &'static [&'static str],
}

const fn field(
    name: &'static str,
    display_name: &'static str,
    value_type: ValueType,
    required: bool,
    aliases: &'static [&'static str],
) -> FieldDef {
    FieldDef {
        name,
        display_name,
        value_type,
        required,
        aliases,
    }
}

// ===== 订单 =====
const ORDER_FIELDS: &[FieldDef] = &[
    field(
        "order_number",
        "Order Number",
        ValueType::Text,
        false,
        &["order_number", "Order Number", "Order #", "Order No", "Order ID", "Invoice Number"],
    ),
    field(
        "customer",
        "Customer",
        ValueType::Relation,
        false,
        &["customer", "Customer", "Customer Name", "Client", "Client Name", "Bill To"],
    ),
    field(
        "order_date",
        "Order Date",
        ValueType::Date,
        false,
        &["order_date", "Order Date", "Date", "Created", "Date Ordered"],
    ),
    field(
        "due_date",
        "Due Date",
        ValueType::Date,
        false,
        &["due_date", "Due Date", "Delivery Date", "Ship Date"],
    ),
    field(
        "description",
        "Description",
        ValueType::Text,
        false,
        &["description", "Description", "Details", "Items", "Notes"],
    ),
    field(
        "total",
        "Total",
        ValueType::Currency,
        false,
        &["total", "Total", "Amount", "Order Total", "Grand Total", "Price"],
    ),
    field(
        "paid",
        "Paid",
        ValueType::Boolean,
        false,
        &["paid", "Paid", "Is Paid", "Payment Status"],
    ),
    field(
        "status",
        "Status",
        ValueType::Text,
        false,
        &["status", "Status", "Order Status", "Stage"],
    ),
];

// ===== 报价单 =====
const QUOTE_FIELDS: &[FieldDef] = &[
    field(
        "quote_number",
        "Quote Number",
        ValueType::Text,
        true,
        &["quote_number", "Quote Number", "Quote #", "Quote No", "Quote ID", "Estimate Number"],
    ),
    field(
        "customer",
        "Customer",
        ValueType::Relation,
        false,
        &["customer", "Customer", "Customer Name", "Client", "Client Name"],
    ),
    field(
        "quote_date",
        "Quote Date",
        ValueType::Date,
        false,
        &["quote_date", "Quote Date", "Date", "Created", "Issued"],
    ),
    field(
        "valid_until",
        "Valid Until",
        ValueType::Date,
        false,
        &["valid_until", "Valid Until", "Expiry Date", "Expires", "Expiration"],
    ),
    field(
        "description",
        "Description",
        ValueType::Text,
        false,
        &["description", "Description", "Details", "Scope", "Notes"],
    ),
    field(
        "amount",
        "Amount",
        ValueType::Currency,
        false,
        &["amount", "Amount", "Total", "Quote Total", "Price"],
    ),
    field(
        "accepted",
        "Accepted",
        ValueType::Boolean,
        false,
        &["accepted", "Accepted", "Approved"],
    ),
];

// ===== 联系人 =====
const CONTACT_FIELDS: &[FieldDef] = &[
    field(
        "name",
        "Name",
        ValueType::Text,
        true,
        &["name", "Name", "Full Name", "Contact Name", "Customer Name", "Company Name"],
    ),
    field(
        "email",
        "Email",
        ValueType::Text,
        false,
        &["email", "Email", "E-mail", "Email Address"],
    ),
    field(
        "phone",
        "Phone",
        ValueType::Text,
        false,
        &["phone", "Phone", "Phone Number", "Telephone", "Mobile"],
    ),
    field(
        "company",
        "Company",
        ValueType::Text,
        false,
        &["company", "Company", "Organization", "Business"],
    ),
    field(
        "address",
        "Address",
        ValueType::Text,
        false,
        &["address", "Address", "Street Address", "Billing Address"],
    ),
    field(
        "notes",
        "Notes",
        ValueType::Text,
        false,
        &["notes", "Notes", "Comments", "Memo"],
    ),
];

// ===== 原料 =====
const INGREDIENT_FIELDS: &[FieldDef] = &[
    field(
        "name",
        "Name",
        ValueType::Text,
        true,
        &["name", "Name", "Ingredient", "Ingredient Name", "Item", "Product"],
    ),
    field(
        "supplier",
        "Supplier",
        ValueType::Relation,
        false,
        &["supplier", "Supplier", "Vendor", "Supplier Name"],
    ),
    field(
        "unit",
        "Unit",
        ValueType::Text,
        false,
        &["unit", "Unit", "UOM", "Unit of Measure"],
    ),
    field(
        "unit_cost",
        "Unit Cost",
        ValueType::Currency,
        false,
        &["unit_cost", "Unit Cost", "Cost", "Price", "Cost per Unit"],
    ),
    field(
        "in_stock",
        "In Stock",
        ValueType::Boolean,
        false,
        &["in_stock", "In Stock", "Available", "Stocked"],
    ),
    field(
        "notes",
        "Notes",
        ValueType::Text,
        false,
        &["notes", "Notes", "Comments"],
    ),
];

/// 获取记录类型的字段表（顺序即映射顺序）
pub fn fields_for(kind: ImportKind) -> &'static [FieldDef] {
    match kind {
        ImportKind::Order => ORDER_FIELDS,
        ImportKind::Quote => QUOTE_FIELDS,
        ImportKind::Contact => CONTACT_FIELDS,
        ImportKind::Ingredient => INGREDIENT_FIELDS,
    }
}

/// 按名称查找字段定义
pub fn field_def(kind: ImportKind, name: &str) -> Option<&'static FieldDef> {
    fields_for(kind).iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_declares_its_natural_key() {
        for kind in ImportKind::ALL {
            let key = field_def(kind, kind.natural_key_field());
            assert!(key.is_some(), "{} 缺少主键字段", kind);
            assert_eq!(key.unwrap().value_type, ValueType::Text);
        }
    }

    #[test]
    fn test_field_names_unique_per_kind() {
        for kind in ImportKind::ALL {
            let fields = fields_for(kind);
            let mut names: Vec<_> = fields.iter().map(|f| f.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), fields.len());
        }
    }

    #[test]
    fn test_alias_belongs_to_one_field_per_kind() {
        use std::collections::HashMap;

        for kind in ImportKind::ALL {
            let mut owners: HashMap<String, &str> = HashMap::new();
            for def in fields_for(kind) {
                for alias in def.aliases {
                    let folded = alias.trim().to_lowercase();
                    if let Some(prev) = owners.insert(folded, def.name) {
                        assert_eq!(prev, def.name, "{} 别名 '{}' 重复", kind, alias);
                    }
                }
            }
        }
    }
}
