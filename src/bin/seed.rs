use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        brands::{ActiveModel as BrandActive, Column as BrandCol, Entity as Brands},
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        frequently_bought_together::{
            ActiveModel as LinkActive, Column as LinkCol, Entity as FrequentlyBoughtTogether,
        },
        product_tags::ActiveModel as TagActive,
        product_variants::ActiveModel as VariantActive,
        products::{ActiveModel as ProductActive, Column as ProductCol, Entity as Products},
        subcategories::{
            ActiveModel as SubcategoryActive, Column as SubcategoryCol, Entity as Subcategories,
        },
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    middleware::auth::{ROLE_ADMIN, ROLE_CUSTOMER},
    services::auth_service::hash_password,
};

struct SeedProduct {
    name: &'static str,
    slug: &'static str,
    brand: &'static str,
    category: &'static str,
    subcategory: Option<&'static str>,
    price: i64,
    old_price: Option<i64>,
    stock: i32,
    featured: bool,
    free_shipping: bool,
    colors: &'static [&'static str],
    tags: &'static [&'static str],
}

const BRANDS: &[(&str, bool)] = &[("Acme", true), ("Northwind", true), ("Contoso", false)];

const CATEGORIES: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "Electronics",
        "electronics",
        &[("Phones", "phones"), ("Laptops", "laptops"), ("Audio", "audio")],
    ),
    (
        "Fashion",
        "fashion",
        &[("Men", "fashion-men"), ("Women", "fashion-women")],
    ),
    ("Home & Kitchen", "home-kitchen", &[("Cookware", "cookware")]),
    ("Sports", "sports", &[]),
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Wireless Earbuds",
        slug: "wireless-earbuds",
        brand: "Acme",
        category: "electronics",
        subcategory: Some("audio"),
        price: 4999,
        old_price: Some(6999),
        stock: 120,
        featured: true,
        free_shipping: true,
        colors: &["Black", "White"],
        tags: &["audio", "bluetooth"],
    },
    SeedProduct {
        name: "Charging Case",
        slug: "charging-case",
        brand: "Acme",
        category: "electronics",
        subcategory: Some("audio"),
        price: 1999,
        old_price: None,
        stock: 80,
        featured: false,
        free_shipping: false,
        colors: &[],
        tags: &["accessory"],
    },
    SeedProduct {
        name: "Ultrabook 14",
        slug: "ultrabook-14",
        brand: "Northwind",
        category: "electronics",
        subcategory: Some("laptops"),
        price: 109_900,
        old_price: Some(129_900),
        stock: 15,
        featured: true,
        free_shipping: true,
        colors: &["Silver", "Graphite"],
        tags: &["laptop", "work"],
    },
    SeedProduct {
        name: "Smartphone X",
        slug: "smartphone-x",
        brand: "Northwind",
        category: "electronics",
        subcategory: Some("phones"),
        price: 69_900,
        old_price: None,
        stock: 40,
        featured: true,
        free_shipping: true,
        colors: &["Blue", "Black"],
        tags: &["phone", "5g"],
    },
    SeedProduct {
        name: "Running Jacket",
        slug: "running-jacket",
        brand: "Contoso",
        category: "fashion",
        subcategory: Some("fashion-men"),
        price: 7999,
        old_price: Some(9999),
        stock: 4,
        featured: false,
        free_shipping: false,
        colors: &["Red", "Navy"],
        tags: &["outdoor"],
    },
    SeedProduct {
        name: "Cast Iron Skillet",
        slug: "cast-iron-skillet",
        brand: "Contoso",
        category: "home-kitchen",
        subcategory: Some("cookware"),
        price: 3499,
        old_price: None,
        stock: 60,
        featured: false,
        free_shipping: false,
        colors: &[],
        tags: &["kitchen"],
    },
    SeedProduct {
        name: "Yoga Mat",
        slug: "yoga-mat",
        brand: "Acme",
        category: "sports",
        subcategory: None,
        price: 2599,
        old_price: Some(2999),
        stock: 3,
        featured: false,
        free_shipping: false,
        colors: &["Purple", "Green"],
        tags: &["fitness"],
    },
];

const BUNDLES: &[(&str, &[&str])] = &[
    ("wireless-earbuds", &["charging-case", "smartphone-x"]),
    ("ultrabook-14", &["wireless-earbuds"]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let orm = create_orm_conn(pool);

    let admin_id = ensure_user(&orm, "admin@example.com", "admin123", ROLE_ADMIN).await?;
    let user_id = ensure_user(&orm, "user@example.com", "user123", ROLE_CUSTOMER).await?;
    seed_brands(&orm).await?;
    seed_categories(&orm).await?;
    seed_products(&orm).await?;
    seed_bundles(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        first_name: Set(None),
        last_name: Set(None),
        phone: Set(None),
        role: Set(role.to_string()),
        is_active: Set(true),
        last_login_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user.id)
}

async fn seed_brands(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for (order, (name, featured)) in BRANDS.iter().enumerate() {
        let exists = Brands::find()
            .filter(BrandCol::Name.eq(*name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        BrandActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            logo_url: Set(None),
            description: Set(None),
            is_featured: Set(*featured),
            display_order: Set(order as i32),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }
    println!("Seeded brands");
    Ok(())
}

async fn seed_categories(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for (order, (name, slug, subcategories)) in CATEGORIES.iter().enumerate() {
        let category = match Categories::find()
            .filter(CategoryCol::Slug.eq(*slug))
            .one(orm)
            .await?
        {
            Some(category) => category,
            None => {
                CategoryActive {
                    id: Set(Uuid::new_v4()),
                    name: Set(name.to_string()),
                    slug: Set(slug.to_string()),
                    description: Set(None),
                    icon_class: Set(None),
                    image_url: Set(None),
                    parent_id: Set(None),
                    display_order: Set(order as i32),
                    is_active: Set(true),
                    show_in_menu: Set(true),
                    created_at: Set(Utc::now().into()),
                }
                .insert(orm)
                .await?
            }
        };

        for (sub_order, (sub_name, sub_slug)) in subcategories.iter().enumerate() {
            let exists = Subcategories::find()
                .filter(SubcategoryCol::Slug.eq(*sub_slug))
                .one(orm)
                .await?
                .is_some();
            if exists {
                continue;
            }
            SubcategoryActive {
                id: Set(Uuid::new_v4()),
                category_id: Set(category.id),
                name: Set(sub_name.to_string()),
                slug: Set(sub_slug.to_string()),
                description: Set(None),
                icon_class: Set(None),
                image_url: Set(None),
                display_order: Set(sub_order as i32),
                is_active: Set(true),
                created_at: Set(Utc::now().into()),
            }
            .insert(orm)
            .await?;
        }
    }
    println!("Seeded categories");
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for seed in PRODUCTS {
        let exists = Products::find()
            .filter(ProductCol::Slug.eq(seed.slug))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let category = Categories::find()
            .filter(CategoryCol::Slug.eq(seed.category))
            .one(orm)
            .await?
            .ok_or_else(|| anyhow::anyhow!("category {} missing", seed.category))?;
        let subcategory_id = match seed.subcategory {
            Some(slug) => Subcategories::find()
                .filter(SubcategoryCol::Slug.eq(slug))
                .one(orm)
                .await?
                .map(|s| s.id),
            None => None,
        };
        let brand_id = Brands::find()
            .filter(BrandCol::Name.eq(seed.brand))
            .one(orm)
            .await?
            .map(|b| b.id);

        let now = Utc::now();
        let product = ProductActive {
            id: Set(Uuid::new_v4()),
            sku: Set(Some(seed.slug.to_uppercase())),
            name: Set(seed.name.to_string()),
            subtitle: Set(None),
            slug: Set(seed.slug.to_string()),
            description: Set(Some(format!("{} by {}", seed.name, seed.brand))),
            image_url: Set(format!("/images/products/{}.jpg", seed.slug)),
            price: Set(seed.price),
            old_price: Set(seed.old_price),
            brand_id: Set(brand_id),
            category_id: Set(category.id),
            subcategory_id: Set(subcategory_id),
            stock_quantity: Set(seed.stock),
            low_stock_threshold: Set(5),
            is_active: Set(true),
            is_featured: Set(seed.featured),
            is_new: Set(true),
            is_on_sale: Set(seed.old_price.is_some()),
            free_shipping: Set(seed.free_shipping),
            shipping_cost: Set(if seed.free_shipping { 0 } else { 599 }),
            views_count: Set(0),
            sales_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;

        for (order, color) in seed.colors.iter().enumerate() {
            VariantActive {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                variant_name: Set(Some(color.to_string())),
                color: Set(Some(color.to_string())),
                size: Set(None),
                image_url: Set(None),
                price_adjustment: Set(0),
                stock_quantity: Set(seed.stock / seed.colors.len() as i32),
                sku: Set(Some(format!("{}-{}", seed.slug, color).to_uppercase())),
                display_order: Set(order as i32),
                is_active: Set(true),
                created_at: Set(now.into()),
            }
            .insert(orm)
            .await?;
        }

        for tag in seed.tags {
            TagActive {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                tag_name: Set(tag.to_string()),
                tag_type: Set(None),
                created_at: Set(now.into()),
            }
            .insert(orm)
            .await?;
        }
    }
    println!("Seeded products");
    Ok(())
}

async fn seed_bundles(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for (main_slug, related_slugs) in BUNDLES {
        let Some(main) = Products::find()
            .filter(ProductCol::Slug.eq(*main_slug))
            .one(orm)
            .await?
        else {
            continue;
        };

        for (order, slug) in related_slugs.iter().enumerate() {
            let Some(related) = Products::find()
                .filter(ProductCol::Slug.eq(*slug))
                .one(orm)
                .await?
            else {
                continue;
            };
            let linked = FrequentlyBoughtTogether::find()
                .filter(LinkCol::ProductId.eq(main.id))
                .filter(LinkCol::RelatedProductId.eq(related.id))
                .one(orm)
                .await?
                .is_some();
            if linked {
                continue;
            }
            LinkActive {
                id: Set(Uuid::new_v4()),
                product_id: Set(main.id),
                related_product_id: Set(related.id),
                display_order: Set(order as i32),
                is_active: Set(true),
                created_at: Set(Utc::now().into()),
            }
            .insert(orm)
            .await?;
        }
    }
    println!("Seeded bundles");
    Ok(())
}
