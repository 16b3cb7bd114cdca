// Catalog management
pub mod ingredients;
pub mod products;

// Versioned BOM stores
pub mod formulations;
pub mod recipes;

// Safety checking
pub mod conflicts;

// Allocation and production
pub mod allocation;
pub mod batches;
pub mod lots;

// Recall support and reporting
pub mod reports;
pub mod traceability;
