// Party records (auth lives outside this crate; these anchor ownership)
pub mod manufacturer;
pub mod supplier;

// Catalog
pub mod ingredient;
pub mod product;
pub mod product_category;

// Versioned supplier formulations
pub mod formulation;
pub mod formulation_material;

// Versioned manufacturer recipes
pub mod recipe;
pub mod recipe_bom_line;

// Inventory and production history
pub mod batch_consumption;
pub mod ingredient_lot;
pub mod product_batch;

// Safety rules
pub mod do_not_combine;
