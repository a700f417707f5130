diesel::table! {
    pipelines (id) {
        id -> Text,
        name -> Text,
        description -> Text,
        active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    pipeline_intake (pipeline_id, day) {
        pipeline_id -> Text,
        day -> Date,
        intake -> Int8,
    }
}

diesel::table! {
    datapoints (pipeline_id, idx) {
        pipeline_id -> Text,
        idx -> Int8,
        value -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    consumers (pipeline_id, consumer_id) {
        pipeline_id -> Text,
        consumer_id -> Text,
        pointer -> Int8,
    }
}

diesel::allow_tables_to_appear_in_same_query!(pipelines, pipeline_intake, datapoints, consumers);
