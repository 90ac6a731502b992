/*!

This is the long-form manual for `kiosk_core` and `votekiosk`.

## The vote file

Votes are stored in a plain text file (`votes.csv` by default). Each vote is one line with the
voter ID and the name of the candidate, separated by a comma:

```text
11111111,John
22222222,Jane
33333333,John
```

There is no header. A new line is appended for each vote, and the file is truncated to zero
bytes when the kiosk is reset. Lines with more than two fields are accepted (the extra fields are
ignored), lines with a single field make the file unreadable.

A kiosk assumes that it is the only program writing to this file while it runs.

## Voter IDs

A voter ID is made of exactly 8 ASCII digits. An ID is refused if:
* it contains anything else than digits (including spaces and signs)
* it does not have 8 digits
* it is already present in the vote file: each ID may vote once

Each session accepts a single vote, for the ID accepted last. After the vote, the session must
be reset (which happens when the results are shown) before another vote can be cast.

## The admin code

The code `1234567891` is recognized before any other check and unlocks the reset of all the votes.
This code is a fixed value, and anyone who knows it can erase the election. It can be changed
with the `adminCode` setting of the configuration file, or disabled by setting it to `null`:

```json
{
  "storePath": "votes.csv",
  "candidates": ["John", "Jane"],
  "adminCode": null
}
```

## Results

The results are recounted from all the votes held by the store every time they are displayed,
never from running counters. The store holds the votes read from the vote file when the kiosk
started, plus the votes cast since then (`VoteStore::reload` re-reads the file):

```text
John: 2 Votes
Jane: 1 Votes
Winner: John
```

The winner is the candidate with strictly more votes than any other one. Otherwise, the result
is a tie. Votes for names that are not on the ballot are ignored.

## Command line

```bash
# Run the kiosk with the default ballot (John, Jane) and votes.csv in the current directory
votekiosk

# Different ballot and vote file
votekiosk --store /var/lib/kiosk/votes.csv --candidates Alice --candidates Bob

# Print the results and write a JSON summary
votekiosk --results --out stdout
```

*/
