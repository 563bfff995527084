mod common;

use std::io::Cursor;

use common::{pdf_text, recipe_payload, TestDb};
use foodgram::error::ErrorCode;
use foodgram::models::{IngredientAmount, RecipeList, RecipeUpdate, UserCreate, MAX_AMOUNT};
use foodgram::services::recipes::{self, RecipeQuery};
use foodgram::services::{ingredients, subscriptions, user_recipes, users, PageRequest};
use foodgram::shopping_list::{self, format_line, layout, render_pdf, ShoppingItem, CLOSING_MESSAGE};

fn item(name: &str, unit: &str, amount: i64) -> ShoppingItem {
    ShoppingItem {
        name: name.to_string(),
        measurement_unit: unit.to_string(),
        amount,
    }
}

#[test]
fn test_shopping_list_sums_only_recipes_in_cart() {
    let t = TestDb::new();
    let alice = t.user("alice");
    let bob = t.user("bob");
    let tag = t.tag("breakfast");
    let egg = t.ingredient("egg", "pcs");
    let flour = t.ingredient("flour", "g");
    let milk = t.ingredient("milk", "ml");

    let a = t.recipe(alice, "Pancakes", &[tag.id], &[(egg.id, 2), (flour.id, 100)]);
    let b = t.recipe(alice, "Crepes", &[tag.id], &[(egg.id, 1), (flour.id, 50)]);
    let c = t.recipe(bob, "Cocoa", &[tag.id], &[(milk.id, 500)]);

    user_recipes::add(&t.db, alice, RecipeList::ShoppingCart, a.id).unwrap();
    user_recipes::add(&t.db, alice, RecipeList::ShoppingCart, b.id).unwrap();
    user_recipes::add(&t.db, bob, RecipeList::ShoppingCart, c.id).unwrap();
    user_recipes::add(&t.db, bob, RecipeList::ShoppingCart, a.id).unwrap();
    // Favorites never feed the shopping list
    user_recipes::add(&t.db, alice, RecipeList::Favorites, c.id).unwrap();

    let alice_list = shopping_list::for_user(&t.db, alice).unwrap();
    assert_eq!(alice_list, vec![item("egg", "pcs", 3), item("flour", "g", 150)]);

    let bob_list = shopping_list::for_user(&t.db, bob).unwrap();
    assert_eq!(
        bob_list,
        vec![
            item("egg", "pcs", 2),
            item("flour", "g", 100),
            item("milk", "ml", 500),
        ]
    );

    let pages = layout("Shopping list", &alice_list);
    assert_eq!(pages[0].lines[0], format_line(1, &alice_list[0]));
    assert_eq!(pages[0].lines[0], "1. egg (pcs) — 3");
    assert_eq!(pages[0].lines[1], "2. flour (g) — 150");
}

#[test]
fn test_cart_totals_stay_bounded_for_largest_amounts() {
    let t = TestDb::new();
    let alice = t.user("alice");
    let tag = t.tag("baking");
    let flour = t.ingredient("flour", "g");
    let a = t.recipe(alice, "Bread", &[tag.id], &[(flour.id, MAX_AMOUNT)]);
    let b = t.recipe(alice, "Rolls", &[tag.id], &[(flour.id, 1)]);
    user_recipes::add(&t.db, alice, RecipeList::ShoppingCart, a.id).unwrap();
    user_recipes::add(&t.db, alice, RecipeList::ShoppingCart, b.id).unwrap();

    let err = recipes::update_recipe(
        &t.db,
        alice,
        b.id,
        RecipeUpdate {
            ingredients: Some(vec![IngredientAmount { id: flour.id, amount: i64::MAX }]),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let list = shopping_list::for_user(&t.db, alice).unwrap();
    assert_eq!(list, vec![item("flour", "g", MAX_AMOUNT + 1)]);
}

#[test]
fn test_empty_cart_still_exports_a_document() {
    let t = TestDb::new();
    let alice = t.user("alice");

    assert!(shopping_list::for_user(&t.db, alice).unwrap().is_empty());
    let pdf = shopping_list::export_pdf(&t.db, alice, "Shopping list").unwrap();
    assert_eq!(pdf_text(&pdf), vec!["Shopping list", CLOSING_MESSAGE]);
}

#[test]
fn test_rendered_pdf_contains_numbered_lines() {
    let pdf = render_pdf(
        "Shopping list",
        &[item("egg", "pcs", 3), item("flour", "g", 150)],
    )
    .unwrap();
    assert_eq!(
        pdf_text(&pdf),
        vec![
            "Shopping list",
            "1. egg (pcs) — 3",
            "2. flour (g) — 150",
            CLOSING_MESSAGE,
        ]
    );
}

#[test]
fn test_rendered_pdf_keeps_cyrillic_text() {
    let pdf = render_pdf("Список покупок", &[item("мука", "г", 150)]).unwrap();
    assert_eq!(
        pdf_text(&pdf),
        vec!["Список покупок", "1. мука (г) — 150", CLOSING_MESSAGE]
    );
}

#[test]
fn test_long_list_text_spans_pages_in_order() {
    let items: Vec<_> = (1..=60).map(|i| item(&format!("item{:02}", i), "g", i)).collect();
    let pdf = render_pdf("Shopping list", &items).unwrap();
    let text = pdf_text(&pdf);

    let pages = layout("Shopping list", &items);
    assert!(pages.len() > 1);
    let expected: Vec<String> = pages
        .iter()
        .flat_map(|p| p.heading.iter().chain(p.lines.iter()).cloned())
        .collect();
    assert_eq!(text, expected);
    assert_eq!(text[60], "60. item60 (g) — 60");
}

#[test]
fn test_export_to_file_writes_pdf() {
    let t = TestDb::new();
    let alice = t.user("alice");
    let tag = t.tag("dinner");
    let rice = t.ingredient("rice", "g");
    let r = t.recipe(alice, "Pilaf", &[tag.id], &[(rice.id, 300)]);
    user_recipes::add(&t.db, alice, RecipeList::ShoppingCart, r.id).unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("out").join("list.pdf");
    let summary =
        shopping_list::export_to_file(&t.db, alice, "Groceries", path.to_str().unwrap()).unwrap();

    assert_eq!(summary.items, 1);
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), summary.bytes);
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_duplicate_list_entries_conflict() {
    let t = TestDb::new();
    let alice = t.user("alice");
    let tag = t.tag("lunch");
    let salt = t.ingredient("salt", "g");
    let r = t.recipe(alice, "Soup", &[tag.id], &[(salt.id, 5)]);

    for list in [RecipeList::Favorites, RecipeList::ShoppingCart] {
        let short = user_recipes::add(&t.db, alice, list, r.id).unwrap();
        assert_eq!(short.name, "Soup");

        let err = user_recipes::add(&t.db, alice, list, r.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);

        let conn = t.db.get_conn().unwrap();
        assert!(list.contains(&conn, alice.id, r.id).unwrap());
        drop(conn);

        user_recipes::remove(&t.db, alice, list, r.id).unwrap();
        let err = user_recipes::remove(&t.db, alice, list, r.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);
    }

    let err = user_recipes::add(&t.db, alice, RecipeList::Favorites, 9999).unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[test]
fn test_subscriptions() {
    let t = TestDb::new();
    let alice = t.user("alice");
    let bob = t.user("bob");
    let tag = t.tag("dessert");
    let sugar = t.ingredient("sugar", "g");
    for name in ["Cake", "Pie", "Tart"] {
        t.recipe(bob, name, &[tag.id], &[(sugar.id, 100)]);
    }

    let err = subscriptions::subscribe(&t.db, alice, alice.id, None).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = subscriptions::subscribe(&t.db, alice, 9999, None).unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let view = subscriptions::subscribe(&t.db, alice, bob.id, Some(2)).unwrap();
    assert!(view.author.is_subscribed);
    assert_eq!(view.recipes.len(), 2);
    assert_eq!(view.recipes[0].name, "Tart");
    assert_eq!(view.recipes_count, 3);

    let err = subscriptions::subscribe(&t.db, alice, bob.id, None).unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);

    let page =
        subscriptions::list_subscriptions(&t.db, alice, PageRequest::default(), 6, Some(1))
            .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].author.username, "bob");
    assert_eq!(page.results[0].recipes.len(), 1);

    assert!(users::get_user(&t.db, Some(alice), bob.id).unwrap().is_subscribed);
    assert!(!users::get_user(&t.db, Some(bob), alice.id).unwrap().is_subscribed);
    assert!(!users::get_user(&t.db, None, bob.id).unwrap().is_subscribed);

    subscriptions::unsubscribe(&t.db, alice, bob.id).unwrap();
    let err = subscriptions::unsubscribe(&t.db, alice, bob.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[test]
fn test_recipe_create_validation() {
    let t = TestDb::new();
    let alice = t.user("alice");
    let tag = t.tag("vegan");
    let kale = t.ingredient("kale", "g");

    let err = recipes::create_recipe(&t.db, alice, recipe_payload("Salad", &[999], &[(kale.id, 1)]))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = recipes::create_recipe(&t.db, alice, recipe_payload("Salad", &[tag.id], &[(999, 1)]))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = recipes::create_recipe(
        &t.db,
        alice,
        recipe_payload("Salad", &[tag.id], &[(kale.id, 1), (kale.id, 2)]),
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = recipes::create_recipe(&t.db, alice, recipe_payload("Salad", &[tag.id], &[(kale.id, 0)]))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = recipes::create_recipe(
        &t.db,
        alice,
        recipe_payload("Salad", &[tag.id], &[(kale.id, i64::MAX)]),
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    // Nothing was persisted by the failed attempts
    let page = recipes::list_recipes(&t.db, None, RecipeQuery::default(), PageRequest::default(), 6)
        .unwrap();
    assert_eq!(page.count, 0);

    let created = t.recipe(alice, "Salad", &[tag.id], &[(kale.id, 200)]);
    assert_eq!(created.ingredients.len(), 1);
    assert_eq!(created.ingredients[0].amount, 200);
    assert_eq!(created.tags[0].slug, "vegan");
    assert_eq!(created.author.username, "alice");

    let err = recipes::create_recipe(&t.db, alice, recipe_payload("Salad", &[tag.id], &[(kale.id, 1)]))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
}

#[test]
fn test_only_author_may_modify_recipe() {
    let t = TestDb::new();
    let alice = t.user("alice");
    let bob = t.user("bob");
    let tag = t.tag("soup");
    let onion = t.ingredient("onion", "pcs");
    let water = t.ingredient("water", "ml");
    let r = t.recipe(alice, "Onion soup", &[tag.id], &[(onion.id, 3)]);

    let update = RecipeUpdate {
        cooking_time: Some(45),
        ingredients: Some(vec![
            IngredientAmount { id: onion.id, amount: 4 },
            IngredientAmount { id: water.id, amount: 1000 },
        ]),
        ..Default::default()
    };

    let err = recipes::update_recipe(&t.db, bob, r.id, update.clone()).unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    let err = recipes::delete_recipe(&t.db, bob, r.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let updated = recipes::update_recipe(&t.db, alice, r.id, update).unwrap();
    assert_eq!(updated.cooking_time, 45);
    assert_eq!(updated.name, "Onion soup");
    assert_eq!(updated.ingredients.len(), 2);
    assert_eq!(updated.tags.len(), 1);

    user_recipes::add(&t.db, bob, RecipeList::ShoppingCart, r.id).unwrap();
    recipes::delete_recipe(&t.db, alice, r.id).unwrap();

    let err = recipes::get_recipe(&t.db, None, r.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert!(shopping_list::for_user(&t.db, bob).unwrap().is_empty());
}

#[test]
fn test_recipe_filters_and_pagination() {
    let t = TestDb::new();
    let alice = t.user("alice");
    let bob = t.user("bob");
    let breakfast = t.tag("breakfast");
    let dinner = t.tag("dinner");
    let snack = t.tag("snack");
    let oats = t.ingredient("oats", "g");

    let porridge = t.recipe(alice, "Porridge", &[breakfast.id], &[(oats.id, 50)]);
    let stew = t.recipe(alice, "Stew", &[dinner.id], &[(oats.id, 10)]);
    let bar = t.recipe(bob, "Oat bar", &[snack.id, breakfast.id], &[(oats.id, 80)]);

    let list = |viewer, query: RecipeQuery, page: PageRequest| {
        recipes::list_recipes(&t.db, viewer, query, page, 6).unwrap()
    };

    let all = list(None, RecipeQuery::default(), PageRequest::default());
    assert_eq!(all.count, 3);
    // Newest first
    assert_eq!(all.results[0].id, bar.id);
    assert_eq!(all.results[2].id, porridge.id);

    let by_tags = list(
        None,
        RecipeQuery {
            tags: vec!["dinner".to_string(), "snack".to_string()],
            ..Default::default()
        },
        PageRequest::default(),
    );
    let ids: Vec<i64> = by_tags.results.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![bar.id, stew.id]);

    let by_author = list(
        None,
        RecipeQuery {
            author: Some(bob.id),
            ..Default::default()
        },
        PageRequest::default(),
    );
    assert_eq!(by_author.count, 1);

    user_recipes::add(&t.db, bob, RecipeList::Favorites, stew.id).unwrap();
    let favorited = list(
        Some(bob),
        RecipeQuery {
            is_favorited: true,
            ..Default::default()
        },
        PageRequest::default(),
    );
    assert_eq!(favorited.count, 1);
    assert!(favorited.results[0].is_favorited);
    assert!(!favorited.results[0].is_in_shopping_cart);

    let anonymous = list(
        None,
        RecipeQuery {
            is_favorited: true,
            ..Default::default()
        },
        PageRequest::default(),
    );
    assert_eq!(anonymous.count, 0);

    let first = list(None, RecipeQuery::default(), PageRequest::new(None, Some(2)));
    assert_eq!(first.results.len(), 2);
    assert_eq!(first.next, Some(2));
    assert_eq!(first.previous, None);

    let second = list(None, RecipeQuery::default(), PageRequest::new(Some(2), Some(2)));
    assert_eq!(second.results.len(), 1);
    assert_eq!(second.next, None);
    assert_eq!(second.previous, Some(1));

    let err = recipes::list_recipes(
        &t.db,
        None,
        RecipeQuery::default(),
        PageRequest::new(Some(3), Some(2)),
        6,
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[test]
fn test_ingredient_lifecycle_and_search() {
    let t = TestDb::new();
    let alice = t.user("alice");
    let tag = t.tag("bread");
    let flour = t.ingredient("flour", "g");
    t.ingredient("flaxseed", "g");
    let yeast = t.ingredient("yeast", "g");
    t.recipe(alice, "Bread", &[tag.id], &[(flour.id, 500)]);

    let found = ingredients::list_ingredients(&t.db, Some("FL")).unwrap();
    let names: Vec<&str> = found.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["flaxseed", "flour"]);

    let err = ingredients::create_ingredient(
        &t.db,
        foodgram::models::IngredientCreate {
            name: "flour".to_string(),
            measurement_unit: "g".to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);

    let err = ingredients::delete_ingredient(&t.db, flour.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    ingredients::delete_ingredient(&t.db, yeast.id).unwrap();
    let err = ingredients::get_ingredient(&t.db, yeast.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[test]
fn test_import_csv() {
    let t = TestDb::new();
    t.ingredient("salt", "g");

    let csv = "name,measurement_unit\nsalt,g\npepper,g\n\npepper,g\nbroken row\nbay leaf,pcs\n";
    let summary = ingredients::import_csv(&t.db, Cursor::new(csv)).unwrap();

    assert_eq!(summary.total_rows, 5);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(ingredients::list_ingredients(&t.db, None).unwrap().len(), 3);
}

#[test]
fn test_register_and_change_password() {
    let t = TestDb::new();
    let registration = |username: &str| UserCreate {
        email: format!("{}@example.com", username),
        username: username.to_string(),
        first_name: "Dana".to_string(),
        last_name: "Cook".to_string(),
        password: "s3cret-pass".to_string(),
    };

    let view = users::register(&t.db, registration("dana")).unwrap();
    assert_eq!(view.username, "dana");
    assert!(!view.is_subscribed);

    let err = users::register(&t.db, registration("dana")).unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);

    let mut weak = registration("eve");
    weak.password = "12345678".to_string();
    let err = users::register(&t.db, weak).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let dana = users::resolve_login(&t.db, "dana@example.com").unwrap();
    assert_eq!(dana.id, view.id);

    let err = users::set_password(
        &t.db,
        dana,
        users::SetPassword {
            current_password: "wrong-pass".to_string(),
            new_password: "another-pass".to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    users::set_password(
        &t.db,
        dana,
        users::SetPassword {
            current_password: "s3cret-pass".to_string(),
            new_password: "another-pass".to_string(),
        },
    )
    .unwrap();
}
