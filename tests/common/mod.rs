//! Shared catalog fixtures for integration tests.

#![allow(dead_code)]

use reflux::{Assembler, CatalogSnapshot, CompileOptions, TableData};

/// A small Postgres shop: customers, orders with an audit trigger, products
/// without a declared primary key, and an orders/products junction table.
pub const SHOP_SNAPSHOT: &str = r#"{
  "dialect": "postgres",
  "tables": [
    {
      "schema": "public",
      "name": "customers",
      "columns": [
        { "name": "id", "data_type": "integer", "allow_null": false,
          "default_value": "nextval('customers_id_seq'::regclass)" },
        { "name": "email", "data_type": "character varying(255)", "allow_null": false },
        { "name": "created_at", "data_type": "timestamp with time zone", "allow_null": false,
          "default_value": "now()" },
        { "name": "updated_at", "data_type": "timestamp with time zone", "allow_null": false }
      ],
      "constraints": [
        { "constraint_name": "customers_pkey", "constraint_type": "PRIMARY KEY",
          "source_table": "customers", "source_column": "id" },
        { "constraint_name": "customers_email_key", "constraint_type": "UNIQUE",
          "source_table": "customers", "source_column": "email" }
      ],
      "indexes": [
        { "name": "customers_pkey", "unique": true, "primary": true, "method": "btree",
          "fields": [{ "attribute": "id" }] },
        { "name": "customers_email_lower", "unique": false, "primary": false, "method": "btree",
          "fields": [{ "attribute": "email", "order": "DESC" }] }
      ]
    },
    {
      "schema": "public",
      "name": "orders",
      "columns": [
        { "name": "id", "data_type": "integer", "allow_null": false,
          "default_value": "nextval('orders_id_seq'::regclass)" },
        { "name": "customer_id", "data_type": "integer", "allow_null": false },
        { "name": "total", "data_type": "numeric", "numeric_precision": 10, "numeric_scale": 2,
          "allow_null": false, "default_value": "0" },
        { "name": "status", "data_type": "USER-DEFINED", "udt_name": "order_status",
          "enum_values": ["pending", "paid", "shipped"], "allow_null": false,
          "default_value": "'pending'::order_status" },
        { "name": "tags", "data_type": "ARRAY", "element_type": "text", "allow_null": true,
          "default_value": "'{}'::text[]" },
        { "name": "notes", "data_type": "text", "allow_null": true,
          "comment": "free-form notes" }
      ],
      "constraints": [
        { "constraint_name": "orders_pkey", "constraint_type": "PRIMARY KEY",
          "source_table": "orders", "source_column": "id" },
        { "constraint_name": "orders_customer_id_fkey", "constraint_type": "FOREIGN KEY",
          "source_schema": "public", "source_table": "orders", "source_column": "customer_id",
          "target_schema": "public", "target_table": "customers", "target_column": "id",
          "on_update": "NO ACTION", "on_delete": "CASCADE" }
      ],
      "triggers": [
        { "trigger_name": "orders_audit", "action_timing": "AFTER",
          "event_manipulation": "INSERT", "action_orientation": "ROW",
          "action_statement": "EXECUTE FUNCTION log_order()",
          "event_object_schema": "public", "event_object_table": "orders",
          "function_name": "log_order", "argument_types": "", "result_type": "trigger",
          "language": "plpgsql",
          "source": "BEGIN\n  INSERT INTO audit_log (order_id) VALUES (NEW.id);\n  RETURN NEW;\nEND;",
          "volatility": "v", "cost": 100 },
        { "trigger_name": "orders_audit", "action_timing": "AFTER",
          "event_manipulation": "UPDATE", "action_orientation": "ROW",
          "action_statement": "EXECUTE FUNCTION log_order()",
          "event_object_schema": "public", "event_object_table": "orders",
          "function_name": "log_order", "argument_types": "", "result_type": "trigger",
          "language": "plpgsql",
          "source": "BEGIN\n  INSERT INTO audit_log (order_id) VALUES (NEW.id);\n  RETURN NEW;\nEND;",
          "volatility": "v", "cost": 100 }
      ]
    },
    {
      "schema": "public",
      "name": "products",
      "columns": [
        { "name": "id", "data_type": "integer", "allow_null": false },
        { "name": "sku", "data_type": "character varying(32)", "allow_null": false },
        { "name": "price", "data_type": "numeric(8,2)", "allow_null": true }
      ]
    },
    {
      "schema": "public",
      "name": "orders_x_products",
      "columns": [
        { "name": "order_id", "data_type": "integer", "allow_null": false },
        { "name": "product_id", "data_type": "integer", "allow_null": false },
        { "name": "created_by", "data_type": "integer", "allow_null": true }
      ],
      "constraints": [
        { "constraint_name": "oxp_order_fkey", "constraint_type": "FOREIGN KEY",
          "source_table": "orders_x_products", "source_column": "order_id",
          "target_schema": "public", "target_table": "orders", "target_column": "id",
          "on_delete": "CASCADE" },
        { "constraint_name": "oxp_product_fkey", "constraint_type": "FOREIGN KEY",
          "source_table": "orders_x_products", "source_column": "product_id",
          "target_schema": "public", "target_table": "products", "target_column": "id",
          "on_delete": "CASCADE" },
        { "constraint_name": "oxp_created_by_fkey", "constraint_type": "FOREIGN KEY",
          "source_table": "orders_x_products", "source_column": "created_by",
          "target_schema": "public", "target_table": "customers", "target_column": "id" }
      ]
    },
    { "schema": "public", "name": "spatial_ref_sys", "columns": [] }
  ]
}"#;

pub fn shop_snapshot() -> CatalogSnapshot {
    CatalogSnapshot::from_json(SHOP_SNAPSHOT).unwrap()
}

pub fn shop_data(options: &CompileOptions) -> TableData {
    Assembler::from_options(options).assemble(&shop_snapshot())
}

/// Fixed ordering base so file names are predictable.
pub fn options() -> CompileOptions {
    CompileOptions {
        migration_timestamp: Some(20240101000000),
        workers: Some(2),
        ..Default::default()
    }
}
