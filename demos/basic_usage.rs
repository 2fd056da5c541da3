//! Basic usage example of the transactional cache.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use txn_cache::{
    error::Result, strategy::CacheStrategy, CacheBuilder, CacheKey, CacheKeyBuilder,
    CachingExecutor, Error,
};

/// Example row: Employment
#[derive(Clone, Serialize, Deserialize, Debug)]
struct Employment {
    id: String,
    loanapp_id: String,
    employer_name: String,
    salary: f64,
}

/// Mock repository that simulates database access
struct EmploymentRepository {
    queries: Cell<u32>,
}

impl EmploymentRepository {
    fn fetch_by_id(&self, id: &str) -> Result<Option<Employment>> {
        self.queries.set(self.queries.get() + 1);
        println!("  [DB] Fetching employment: {}", id);

        let employment = match id {
            "emp_001" => Some(Employment {
                id: id.to_string(),
                loanapp_id: "loan_123".to_string(),
                employer_name: "Acme Corp".to_string(),
                salary: 75000.0,
            }),
            "emp_002" => Some(Employment {
                id: id.to_string(),
                loanapp_id: "loan_456".to_string(),
                employer_name: "Tech Inc".to_string(),
                salary: 95000.0,
            }),
            _ => None,
        };

        Ok(employment)
    }
}

fn select_employment(id: &str) -> CacheKey {
    CacheKeyBuilder::statement("EmploymentMapper.selectById")
        .sql("SELECT * FROM employment WHERE id = ?")
        .param(id)
        .environment("development")
        .build()
}

fn print_row(label: &str, row: &Option<Option<Employment>>) {
    match row {
        Some(Some(emp)) => println!(
            "   ✓ {}: {} at {} for {} (${:.2})\n",
            label, emp.id, emp.employer_name, emp.loanapp_id, emp.salary
        ),
        Some(None) => println!("   ✓ {}: no such row (negative result cached)\n", label),
        None => println!("   ✓ {}: cache miss, no database fallback\n", label),
    }
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== txn-cache - Basic Example ===\n");

    // 1. Build the region
    println!("1. Building the EmploymentMapper region...");
    let region = CacheBuilder::new("EmploymentMapper")
        .blocking(true)
        .build::<CacheKey, Option<Employment>>()?;
    let repository = EmploymentRepository {
        queries: Cell::new(0),
    };
    println!("   ✓ Region '{}' ready\n", region.id());

    // 2. First unit of work - miss, load, commit
    println!("2. First unit of work reads emp_001:");
    let mut executor = CachingExecutor::new();
    let row = executor.query(
        &region,
        &select_employment("emp_001"),
        CacheStrategy::Refresh,
        || repository.fetch_by_id("emp_001"),
    )?;
    print_row("Loaded from database", &row);

    let row = executor.query(
        &region,
        &select_employment("emp_999"),
        CacheStrategy::Refresh,
        || repository.fetch_by_id("emp_999"),
    )?;
    print_row("Loaded from database", &row);
    executor.commit()?;
    println!("   ✓ Committed ({} rows in region)\n", region.size());

    // 3. Second unit of work - hits, including the negative result
    println!("3. Second unit of work reads emp_001 and emp_999 again:");
    let mut executor = CachingExecutor::new();
    for id in ["emp_001", "emp_999"] {
        let row = executor.query(
            &region,
            &select_employment(id),
            CacheStrategy::Refresh,
            || repository.fetch_by_id(id),
        )?;
        print_row("Served from cache", &row);
    }
    executor.commit()?;

    // 4. Fresh strategy - cache only
    println!("4. Fresh strategy (cache only) for emp_002:");
    let mut executor = CachingExecutor::new();
    let row = executor.query(
        &region,
        &select_employment("emp_002"),
        CacheStrategy::Fresh,
        || repository.fetch_by_id("emp_002"),
    )?;
    print_row("Fresh lookup", &row);
    executor.rollback();

    // 5. Rolled-back work publishes nothing
    println!("5. Unit of work that fails after loading emp_002:");
    let mut executor = CachingExecutor::new();
    executor.query(
        &region,
        &select_employment("emp_002"),
        CacheStrategy::Refresh,
        || repository.fetch_by_id("emp_002"),
    )?;
    let failed: Result<()> = Err(Error::RepositoryError("deadlock detected".to_string()));
    if let Err(e) = failed {
        println!("   ✗ {}", e);
        executor.rollback();
    }
    println!("   ✓ Rolled back ({} rows in region)\n", region.size());

    // 6. Write statement - flush the region on commit
    println!("6. Update statement flushes the region:");
    let mut executor = CachingExecutor::new();
    executor.flush(&region);
    println!("   Before commit: {} rows in region", region.size());
    executor.commit()?;
    println!("   ✓ After commit: {} rows in region\n", region.size());

    // 7. Bypass strategy - skip cache
    println!("7. Bypass strategy (skip cache):");
    let mut executor = CachingExecutor::new();
    let row = executor.query(
        &region,
        &select_employment("emp_001"),
        CacheStrategy::Bypass,
        || repository.fetch_by_id("emp_001"),
    )?;
    print_row("Fetched directly from database", &row);
    executor.commit()?;

    println!(
        "=== Example Complete ({} database queries) ===\n",
        repository.queries.get()
    );

    Ok(())
}
