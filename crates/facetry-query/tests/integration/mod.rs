mod facet_round_trip;
mod search_state;
