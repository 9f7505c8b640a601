//! Table registry and SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.
//!
//! Every table the data-access layer serves is declared here once. The
//! declarations drive DDL generation, column whitelisting for filters and
//! ordering, row decoding, shallow embeds and the archive cascade.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    /// Stored as INTEGER 0/1.
    Bool,
    /// RFC3339 text, always normalized to UTC.
    Timestamp,
    /// `YYYY-MM-DD` text.
    Date,
}

impl ColumnKind {
    fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Text | ColumnKind::Timestamp | ColumnKind::Date => "TEXT",
            ColumnKind::Integer | ColumnKind::Bool => "INTEGER",
            ColumnKind::Real => "REAL",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    pub unique: bool,
    /// SQL literal used as column DEFAULT.
    pub default: Option<&'static str>,
}

impl Column {
    const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            unique: false,
            default: None,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    const fn default_sql(mut self, literal: &'static str) -> Self {
        self.required = true;
        self.default = Some(literal);
        self
    }
}

const fn text(name: &'static str) -> Column {
    Column::new(name, ColumnKind::Text)
}

const fn integer(name: &'static str) -> Column {
    Column::new(name, ColumnKind::Integer)
}

const fn real(name: &'static str) -> Column {
    Column::new(name, ColumnKind::Real)
}

const fn flag(name: &'static str) -> Column {
    Column::new(name, ColumnKind::Bool).default_sql("0")
}

const fn timestamp(name: &'static str) -> Column {
    Column::new(name, ColumnKind::Timestamp)
}

const fn date(name: &'static str) -> Column {
    Column::new(name, ColumnKind::Date)
}

const ID: Column = text("id").required();
const ARCHIVED: Column = flag("archived");
const CREATED_AT: Column = timestamp("created_at").required();
const UPDATED_AT: Column = timestamp("updated_at").required();

/// Declared reference from `column` to `table.id`, embeddable under `alias`.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub column: &'static str,
    pub table: &'static str,
    pub alias: &'static str,
}

/// Child rows that follow the parent's `archived` flag.
#[derive(Debug, Clone, Copy)]
pub struct Dependent {
    pub table: &'static str,
    pub column: &'static str,
}

/// Human-readable number assigned by the backend on insert: `{prefix}-{n:05}`.
#[derive(Debug, Clone, Copy)]
pub struct CodeSequence {
    pub column: &'static str,
    pub prefix: &'static str,
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub foreign_keys: &'static [ForeignKey],
    pub archive_cascade: &'static [Dependent],
    pub code: Option<CodeSequence>,
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn relation(&self, alias: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.alias == alias)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// `CREATE TABLE` plus one index per foreign key column.
    pub fn create_statements(&self) -> Vec<String> {
        let mut defs: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut def = format!("{} {}", c.name, c.kind.sql_type());
                if c.name == "id" {
                    def.push_str(" PRIMARY KEY");
                }
                if c.required {
                    def.push_str(" NOT NULL");
                }
                if c.unique {
                    def.push_str(" UNIQUE");
                }
                if let Some(default) = c.default {
                    def.push_str(" DEFAULT ");
                    def.push_str(default);
                }
                if let Some(fk) = self.foreign_keys.iter().find(|fk| fk.column == c.name) {
                    def.push_str(&format!(" REFERENCES {}(id)", fk.table));
                }
                def
            })
            .collect();
        if defs.is_empty() {
            defs.push("id TEXT PRIMARY KEY NOT NULL".to_string());
        }

        let mut statements = vec![format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            defs.join(",\n    ")
        )];
        statements.extend(self.foreign_keys.iter().map(|fk| {
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table}({column})",
                table = self.name,
                column = fk.column
            )
        }));
        if self.has_column("status") {
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_status ON {table}(status)",
                table = self.name
            ));
        }
        statements
    }
}

pub static CUSTOMERS: TableDef = TableDef {
    name: "customers",
    columns: &[
        ID,
        text("customer_code").unique(),
        text("company_name").required(),
        text("contact_name"),
        text("email").unique(),
        text("phone"),
        text("city"),
        text("country"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[],
    archive_cascade: &[Dependent {
        table: "leads",
        column: "customer_id",
    }],
    code: Some(CodeSequence {
        column: "customer_code",
        prefix: "CUS",
    }),
};

pub static LEADS: TableDef = TableDef {
    name: "leads",
    columns: &[
        ID,
        text("customer_id"),
        text("title").required(),
        text("pipeline"),
        text("status").default_sql("'new'"),
        real("value"),
        text("source"),
        text("notes"),
        flag("converted"),
        timestamp("configurator_synced_at"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[ForeignKey {
        column: "customer_id",
        table: "customers",
        alias: "customer",
    }],
    archive_cascade: &[Dependent {
        table: "offers",
        column: "lead_id",
    }],
    code: None,
};

pub static OFFERS: TableDef = TableDef {
    name: "offers",
    columns: &[
        ID,
        text("lead_id").required(),
        text("offer_code").required().unique(),
        real("amount"),
        text("status").default_sql("'draft'"),
        text("notes"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[ForeignKey {
        column: "lead_id",
        table: "leads",
        alias: "lead",
    }],
    archive_cascade: &[],
    code: None,
};

pub static PARTNERS: TableDef = TableDef {
    name: "partners",
    columns: &[
        ID,
        text("kind").required(),
        text("company_name").required(),
        text("contact_name"),
        text("email"),
        text("phone"),
        text("country"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[],
    archive_cascade: &[],
    code: None,
};

pub static ORDERS: TableDef = TableDef {
    name: "orders",
    columns: &[
        ID,
        text("order_number").unique(),
        text("customer_id").required(),
        text("lead_id"),
        text("offer_id"),
        text("order_type").required(),
        text("status").default_sql("'pending'"),
        text("product"),
        integer("quantity"),
        real("total_amount"),
        text("notes"),
        timestamp("completed_at"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[
        ForeignKey {
            column: "customer_id",
            table: "customers",
            alias: "customer",
        },
        ForeignKey {
            column: "lead_id",
            table: "leads",
            alias: "lead",
        },
        ForeignKey {
            column: "offer_id",
            table: "offers",
            alias: "offer",
        },
    ],
    archive_cascade: &[
        Dependent {
            table: "work_orders",
            column: "order_id",
        },
        Dependent {
            table: "service_orders",
            column: "order_id",
        },
        Dependent {
            table: "shipping_orders",
            column: "order_id",
        },
    ],
    code: Some(CodeSequence {
        column: "order_number",
        prefix: "ORD",
    }),
};

pub static WORK_ORDERS: TableDef = TableDef {
    name: "work_orders",
    columns: &[
        ID,
        text("order_id").required(),
        text("product"),
        integer("quantity"),
        text("status").default_sql("'queued'"),
        text("notes"),
        timestamp("completed_at"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[ForeignKey {
        column: "order_id",
        table: "orders",
        alias: "order",
    }],
    archive_cascade: &[],
    code: None,
};

pub static SERVICE_ORDERS: TableDef = TableDef {
    name: "service_orders",
    columns: &[
        ID,
        text("order_id").required(),
        text("work_order_id"),
        text("customer_id"),
        text("service_type").required(),
        date("scheduled_date"),
        text("technician"),
        text("status").default_sql("'scheduled'"),
        text("notes"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[
        ForeignKey {
            column: "order_id",
            table: "orders",
            alias: "order",
        },
        ForeignKey {
            column: "work_order_id",
            table: "work_orders",
            alias: "work_order",
        },
        ForeignKey {
            column: "customer_id",
            table: "customers",
            alias: "customer",
        },
    ],
    archive_cascade: &[],
    code: None,
};

pub static SHIPPING_ORDERS: TableDef = TableDef {
    name: "shipping_orders",
    columns: &[
        ID,
        text("order_id").required(),
        text("customer_id"),
        text("ship_to"),
        text("article"),
        integer("quantity"),
        text("carrier"),
        text("tracking_number"),
        text("status").default_sql("'pending'"),
        flag("picked"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[
        ForeignKey {
            column: "order_id",
            table: "orders",
            alias: "order",
        },
        ForeignKey {
            column: "customer_id",
            table: "customers",
            alias: "customer",
        },
    ],
    archive_cascade: &[],
    code: None,
};

pub static PURCHASE_ORDERS: TableDef = TableDef {
    name: "purchase_orders",
    columns: &[
        ID,
        text("po_number").unique(),
        text("partner_id"),
        text("supplier_name").required(),
        text("supplier_email"),
        text("status").default_sql("'draft'"),
        date("expected_date"),
        real("total_amount"),
        text("notes"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[ForeignKey {
        column: "partner_id",
        table: "partners",
        alias: "partner",
    }],
    archive_cascade: &[],
    code: Some(CodeSequence {
        column: "po_number",
        prefix: "PO",
    }),
};

pub static SERIALS: TableDef = TableDef {
    name: "serials",
    columns: &[
        ID,
        text("serial_number").required().unique(),
        text("product"),
        text("work_order_id"),
        text("order_id"),
        text("customer_id"),
        text("status").default_sql("'in_stock'"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[
        ForeignKey {
            column: "work_order_id",
            table: "work_orders",
            alias: "work_order",
        },
        ForeignKey {
            column: "order_id",
            table: "orders",
            alias: "order",
        },
        ForeignKey {
            column: "customer_id",
            table: "customers",
            alias: "customer",
        },
    ],
    archive_cascade: &[],
    code: None,
};

pub static RMAS: TableDef = TableDef {
    name: "rmas",
    columns: &[
        ID,
        text("rma_number").unique(),
        text("serial_id"),
        text("customer_id"),
        text("reason").required(),
        text("status").default_sql("'open'"),
        text("resolution"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[
        ForeignKey {
            column: "serial_id",
            table: "serials",
            alias: "serial",
        },
        ForeignKey {
            column: "customer_id",
            table: "customers",
            alias: "customer",
        },
    ],
    archive_cascade: &[],
    code: Some(CodeSequence {
        column: "rma_number",
        prefix: "RMA",
    }),
};

pub static MOVEMENTS: TableDef = TableDef {
    name: "movements",
    columns: &[
        ID,
        text("article").required(),
        integer("quantity").required(),
        text("direction").required(),
        text("shipping_order_id"),
        text("note"),
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[ForeignKey {
        column: "shipping_order_id",
        table: "shipping_orders",
        alias: "shipping_order",
    }],
    archive_cascade: &[],
    code: None,
};

pub static CONTENT_ITEMS: TableDef = TableDef {
    name: "content_items",
    columns: &[
        ID,
        text("title").required(),
        text("channel"),
        text("body"),
        date("due_date"),
        text("status").default_sql("'idea'"),
        flag("published"),
        timestamp("published_at"),
        ARCHIVED,
        CREATED_AT,
        UPDATED_AT,
    ],
    foreign_keys: &[],
    archive_cascade: &[],
    code: None,
};

/// Declaration order doubles as creation order (referenced tables first).
pub static TABLES: [&TableDef; 13] = [
    &CUSTOMERS,
    &LEADS,
    &OFFERS,
    &PARTNERS,
    &ORDERS,
    &WORK_ORDERS,
    &SERVICE_ORDERS,
    &SHIPPING_ORDERS,
    &PURCHASE_ORDERS,
    &SERIALS,
    &RMAS,
    &MOVEMENTS,
    &CONTENT_ITEMS,
];

pub fn table(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().copied().find(|t| t.name == name)
}

/// All DDL statements, in execution order.
pub fn init_statements() -> Vec<String> {
    TABLES
        .iter()
        .flat_map(|t| t.create_statements())
        .collect()
}
