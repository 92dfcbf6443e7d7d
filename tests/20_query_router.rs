mod common;

use anyhow::Result;
use hub_api::database::identifier::LogicalTable;
use hub_api::database::manager::DatabaseError;
use hub_api::database::query_builder::QueryBuilder;
use hub_api::filter::types::FilterData;
use serde_json::{json, Map, Value};
use uuid::Uuid;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn id_of(row: &Value) -> Uuid {
    row["id"].as_str().and_then(|s| Uuid::parse_str(s).ok()).expect("row id")
}

#[tokio::test]
async fn deleting_a_workout_cascades_to_exercises_and_sets() -> Result<()> {
    let Some(pool) = common::test_pool().await else { return Ok(()) };
    let schema = common::fresh_schema(&pool).await?;
    let owner = Uuid::new_v4();

    let workouts = QueryBuilder::new(&schema, LogicalTable::Workouts, owner);
    let exercises = QueryBuilder::new(&schema, LogicalTable::Exercises, owner);
    let sets = QueryBuilder::new(&schema, LogicalTable::Sets, owner);

    let workout = workouts
        .insert(&pool, &object(json!({ "name": "Push day", "date": "2024-03-01" })))
        .await?;
    let exercise = exercises
        .insert(&pool, &object(json!({ "workout_id": id_of(&workout), "name": "Bench press" })))
        .await?;
    assert_eq!(exercise["order"], json!(0));
    let set = sets
        .insert(&pool, &object(json!({ "exercise_id": id_of(&exercise), "set_number": 1, "reps": 5, "weight": 80.5 })))
        .await?;
    assert_eq!(set["completed"], json!(false));

    workouts.delete(&pool, id_of(&workout)).await?;

    assert!(exercises.list(&pool).await?.is_empty());
    assert!(sets.list(&pool).await?.is_empty());
    assert!(matches!(
        sets.find_by_id(&pool, id_of(&set)).await,
        Err(DatabaseError::NotFound(_))
    ));

    common::drop_schema(&pool, &schema).await;
    Ok(())
}

#[tokio::test]
async fn children_of_another_owner_are_invisible() -> Result<()> {
    let Some(pool) = common::test_pool().await else { return Ok(()) };
    let schema = common::fresh_schema(&pool).await?;
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let workout = QueryBuilder::new(&schema, LogicalTable::Workouts, owner)
        .insert(&pool, &object(json!({ "name": "Legs", "date": "2024-03-02" })))
        .await?;

    let err = QueryBuilder::new(&schema, LogicalTable::Exercises, stranger)
        .insert(&pool, &object(json!({ "workout_id": id_of(&workout), "name": "Squat" })))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound(_)), "got {err:?}");

    let exercise = QueryBuilder::new(&schema, LogicalTable::Exercises, owner)
        .insert(&pool, &object(json!({ "workout_id": id_of(&workout), "name": "Squat" })))
        .await?;
    assert!(QueryBuilder::new(&schema, LogicalTable::Exercises, stranger).list(&pool).await?.is_empty());
    assert!(matches!(
        QueryBuilder::new(&schema, LogicalTable::Exercises, stranger)
            .delete(&pool, id_of(&exercise))
            .await,
        Err(DatabaseError::NotFound(_))
    ));

    common::drop_schema(&pool, &schema).await;
    Ok(())
}

#[tokio::test]
async fn second_body_metric_for_a_day_is_a_duplicate() -> Result<()> {
    let Some(pool) = common::test_pool().await else { return Ok(()) };
    let schema = common::fresh_schema(&pool).await?;
    let metrics = QueryBuilder::new(&schema, LogicalTable::BodyMetrics, Uuid::new_v4());

    metrics.insert(&pool, &object(json!({ "date": "2024-01-15", "weight": 72.4 }))).await?;
    let err = metrics
        .insert(&pool, &object(json!({ "date": "2024-01-15", "weight": 72.0 })))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateEntry(_)), "got {err:?}");

    common::drop_schema(&pool, &schema).await;
    Ok(())
}

#[tokio::test]
async fn malformed_values_and_unknown_columns_are_rejected() -> Result<()> {
    let Some(pool) = common::test_pool().await else { return Ok(()) };
    let schema = common::fresh_schema(&pool).await?;
    let todos = QueryBuilder::new(&schema, LogicalTable::Todos, Uuid::new_v4());

    let err = todos
        .insert(&pool, &object(json!({ "title": "x", "due_date": "not-a-date" })))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidValue(_)), "got {err:?}");

    let err = todos
        .insert(&pool, &object(json!({ "title": "x", "colour": "red" })))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UnknownColumn { .. }), "got {err:?}");

    common::drop_schema(&pool, &schema).await;
    Ok(())
}

#[tokio::test]
async fn date_range_filters_and_default_order() -> Result<()> {
    let Some(pool) = common::test_pool().await else { return Ok(()) };
    let schema = common::fresh_schema(&pool).await?;
    let owner = Uuid::new_v4();
    let logs = QueryBuilder::new(&schema, LogicalTable::NutritionLogs, owner);

    for (date, food) in [("2024-02-01", "Oats"), ("2024-02-03", "Rice"), ("2024-02-05", "Soup")] {
        logs.insert(&pool, &object(json!({ "date": date, "food_name": food, "calories": 300 }))).await?;
    }

    let rows = QueryBuilder::new(&schema, LogicalTable::NutritionLogs, owner)
        .filter(FilterData::new().gte("date", "2024-02-02").lte("date", "2024-02-05"))
        .list(&pool)
        .await?;
    let foods: Vec<&str> = rows.iter().filter_map(|r| r["food_name"].as_str()).collect();
    assert_eq!(foods, vec!["Soup", "Rice"]);
    assert_eq!(rows[0]["meal_type"], json!("SNACK"));

    common::drop_schema(&pool, &schema).await;
    Ok(())
}
