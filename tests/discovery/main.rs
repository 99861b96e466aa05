mod semantic_search;
